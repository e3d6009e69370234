//! Controller wiring helpers for common transport and observability setups.

use std::sync::Arc;

use crate::{
    ChatTransport, InMemoryTransport, MetricsObservabilityHooks, SafeSessionHooks,
    SafeTransportHooks, SessionConfig, SessionController, SessionError, TracingObservabilityHooks,
};

pub fn session_controller(
    transport: Arc<dyn ChatTransport>,
    config: SessionConfig,
) -> Result<SessionController, SessionError> {
    SessionController::new(transport, config)
}

/// Controller over an [`InMemoryTransport`]; the transport handle is returned for
/// seeding history and simulating pushes.
pub fn in_memory_controller(
    config: SessionConfig,
) -> Result<(SessionController, InMemoryTransport), SessionError> {
    let transport = InMemoryTransport::new();
    let controller = session_controller(Arc::new(transport.clone()), config)?;
    Ok((controller, transport))
}

/// Controller emitting `tracing` events for transport attempts and session activity.
pub fn observed_controller(
    transport: Arc<dyn ChatTransport>,
    config: SessionConfig,
) -> Result<SessionController, SessionError> {
    SessionController::builder(transport)
        .config(config)
        .hooks(Arc::new(SafeSessionHooks::new(TracingObservabilityHooks)))
        .transport_hooks(Arc::new(SafeTransportHooks::new(TracingObservabilityHooks)))
        .build()
}

/// Controller recording `parley_*` metrics through the installed `metrics` recorder.
pub fn metered_controller(
    transport: Arc<dyn ChatTransport>,
    config: SessionConfig,
) -> Result<SessionController, SessionError> {
    SessionController::builder(transport)
        .config(config)
        .hooks(Arc::new(SafeSessionHooks::new(MetricsObservabilityHooks)))
        .transport_hooks(Arc::new(SafeTransportHooks::new(MetricsObservabilityHooks)))
        .build()
}

pub fn controller_from_env(
    transport: Arc<dyn ChatTransport>,
) -> Result<SessionController, SessionError> {
    observed_controller(transport, SessionConfig::from_env()?)
}

#[cfg(feature = "http")]
pub fn http_transport(config: crate::HttpTransportConfig) -> crate::HttpTransport {
    crate::HttpTransport::new(reqwest::Client::new(), config)
}

#[cfg(feature = "http")]
pub fn http_controller(
    transport_config: crate::HttpTransportConfig,
    config: SessionConfig,
) -> Result<SessionController, SessionError> {
    observed_controller(Arc::new(http_transport(transport_config)), config)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{LoadOutcome, SessionConfig, SkipReason, parley_history};

    use super::{in_memory_controller, metered_controller, observed_controller};

    #[tokio::test]
    async fn in_memory_controller_opens_seeded_session() {
        let (controller, transport) =
            in_memory_controller(SessionConfig::default()).expect("controller");
        transport.seed_history(
            "s1",
            parley_history!("s1";
                support "srv-1" => "Hello!",
                user "srv-2" => "Hi, I have a question.",
            ),
        );

        controller.set_session(Some("s1".into())).await.expect("open");

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.messages.len(), 2);
        assert_eq!(
            controller.load_more().await.expect("load"),
            LoadOutcome::Skipped(SkipReason::Exhausted)
        );
    }

    #[tokio::test]
    async fn observed_and_metered_controllers_send_messages() {
        let transport = crate::InMemoryTransport::new();
        let observed =
            observed_controller(Arc::new(transport.clone()), SessionConfig::default())
                .expect("observed");
        let metered = metered_controller(Arc::new(transport.clone()), SessionConfig::default())
            .expect("metered");

        observed.set_session(Some("a".into())).await.expect("open a");
        metered.set_session(Some("b".into())).await.expect("open b");

        observed.send("from a", Vec::new()).await.expect("send a");
        metered.send("from b", Vec::new()).await.expect("send b");

        assert_eq!(observed.snapshot().messages.len(), 1);
        assert_eq!(metered.snapshot().messages.len(), 1);
        assert_eq!(transport.send_count(), 2);
    }
}
