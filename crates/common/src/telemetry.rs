use crate::config::TracingConfig;
use crate::error::{IndexError, Result};
use once_cell::sync::Lazy;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static TRACER_PROVIDER: Lazy<Mutex<Option<SdkTracerProvider>>> = Lazy::new(|| Mutex::new(None));

/// Install the global subscriber. `RUST_LOG` takes precedence over `config.level`.
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| IndexError::Config(format!("invalid log level '{}': {}", config.level, e)))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(false);

    let otel_layer = match &config.otlp_endpoint {
        Some(endpoint) => {
            let exporter = SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint.clone())
                .build()
                .map_err(|e| IndexError::Config(format!("failed to build OTLP exporter: {}", e)))?;

            let resource = Resource::builder()
                .with_service_name(config.service_name.clone())
                .build();

            let provider = SdkTracerProvider::builder()
                .with_resource(resource)
                .with_batch_exporter(exporter)
                .build();

            let tracer = provider.tracer(config.service_name.clone());
            opentelemetry::global::set_tracer_provider(provider.clone());
            if let Ok(mut slot) = TRACER_PROVIDER.lock() {
                *slot = Some(provider);
            }
            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| IndexError::Config(format!("tracing already initialized: {}", e)))?;

    info!("Tracing initialized with level: {}", config.level);
    if let Some(endpoint) = &config.otlp_endpoint {
        info!("OpenTelemetry exporting to {}", endpoint);
    }
    Ok(())
}

/// Flush and drop the OTLP tracer provider, if one was installed
pub fn shutdown_tracing() {
    let provider = TRACER_PROVIDER.lock().ok().and_then(|mut slot| slot.take());
    if let Some(provider) = provider {
        if let Err(e) = provider.shutdown() {
            eprintln!("Error shutting down tracer provider: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error() {
        let config = TracingConfig::default();
        assert!(init_tracing(&config).is_ok());
        assert!(matches!(init_tracing(&config), Err(IndexError::Config(_))));
        shutdown_tracing();
    }
}
