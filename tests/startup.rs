//! Startup and mode dispatch through a fake network provider.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use tailnet_ingress::config::validation::validate_config;
use tailnet_ingress::config::{IngressConfig, ModeChoice, RawConfig, ValidationError};
use tailnet_ingress::forward::{DeclarativeForwardSpec, ForwardError};
use tailnet_ingress::lifecycle::{IngressMode, IngressPlan, PreparedIngress, Shutdown, StartupError};
use tailnet_ingress::net::{IngressListener, NetworkProvider, ProviderError, Reachability};

/// Records what the ingress asks of the network.
#[derive(Default)]
struct FakeProvider {
    domains: Vec<String>,
    applied: Mutex<Vec<DeclarativeForwardSpec>>,
    listened: Mutex<Vec<(u16, Reachability)>>,
}

#[async_trait]
impl NetworkProvider for FakeProvider {
    async fn listen(&self, port: u16, reachability: Reachability) -> Result<IngressListener, ProviderError> {
        self.listened.lock().unwrap().push((port, reachability));
        let tcp = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|source| ProviderError::Listen {
                addr: "127.0.0.1:0".into(),
                source,
            })?;
        Ok(IngressListener::plain(tcp, reachability))
    }

    async fn cert_domains(&self) -> Result<Vec<String>, ProviderError> {
        Ok(self.domains.clone())
    }

    async fn apply_forward_spec(&self, spec: &DeclarativeForwardSpec) -> Result<(), ProviderError> {
        self.applied.lock().unwrap().push(spec.clone());
        Ok(())
    }
}

fn config(raw: RawConfig) -> IngressConfig {
    validate_config(RawConfig {
        hostname: Some("web".into()),
        ..raw
    })
    .unwrap()
}

#[tokio::test]
async fn declarative_launch_applies_spec_for_first_domain() {
    let provider = FakeProvider {
        domains: vec!["web.example.ts.net".into(), "other.example.ts.net".into()],
        ..Default::default()
    };
    let c = config(RawConfig {
        backend: Some("8080".into()),
        mount_path: Some("/svc".into()),
        ..Default::default()
    });
    let plan = IngressPlan::from_config(&c).unwrap();
    assert_eq!(plan.mode(), IngressMode::DeclarativeForward);

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.trigger();
    });

    tokio::time::timeout(Duration::from_secs(5), plan.launch(&provider, &shutdown))
        .await
        .expect("launch did not return after shutdown")
        .unwrap();

    let applied = provider.applied.lock().unwrap();
    assert_eq!(applied.len(), 1);
    assert_eq!(
        applied[0].proxy_for(443, "web.example.ts.net:443", "/svc"),
        Some("http://127.0.0.1:8080")
    );
    assert!(applied[0].listeners[&443].terminate_tls);
    assert!(provider.listened.lock().unwrap().is_empty());
}

#[tokio::test]
async fn declarative_launch_without_domains_fails() {
    let provider = FakeProvider::default();
    let c = config(RawConfig {
        backend: Some("8080".into()),
        ..Default::default()
    });
    let plan = IngressPlan::from_config(&c).unwrap();

    let err = plan.launch(&provider, &Shutdown::new()).await.unwrap_err();
    assert!(matches!(err, StartupError::Forward(ForwardError::NoDomain)));
    assert!(provider.applied.lock().unwrap().is_empty());
}

#[tokio::test]
async fn declarative_prepare_checks_domains_before_applying() {
    let provider = FakeProvider::default();
    let c = config(RawConfig {
        backend: Some("8080".into()),
        ..Default::default()
    });
    let plan = IngressPlan::from_config(&c).unwrap();

    match plan.prepare(&provider).await {
        Err(StartupError::Forward(ForwardError::NoDomain)) => {}
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("prepared without a certified domain"),
    }
    assert!(provider.applied.lock().unwrap().is_empty());
    assert!(provider.listened.lock().unwrap().is_empty());
}

#[tokio::test]
async fn prepared_declarative_spec_is_applied_only_on_run() {
    let provider = FakeProvider {
        domains: vec!["web.example.ts.net".into()],
        ..Default::default()
    };
    let c = config(RawConfig {
        backend: Some("8080".into()),
        ..Default::default()
    });
    let prepared = match IngressPlan::from_config(&c).unwrap().prepare(&provider).await {
        Ok(prepared) => prepared,
        Err(e) => panic!("prepare failed: {}", e),
    };
    assert_eq!(prepared.mode(), IngressMode::DeclarativeForward);
    assert!(provider.applied.lock().unwrap().is_empty());

    let shutdown = Shutdown::new();
    shutdown.trigger();
    prepared.run(&provider, &shutdown).await.unwrap();
    assert_eq!(provider.applied.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn active_prepare_binds_listener_before_serving() {
    let provider = FakeProvider::default();
    let c = config(RawConfig {
        backend: Some("8080".into()),
        funnel: Some(true),
        ..Default::default()
    });
    let prepared = match IngressPlan::from_config(&c).unwrap().prepare(&provider).await {
        Ok(prepared) => prepared,
        Err(e) => panic!("prepare failed: {}", e),
    };
    assert!(matches!(prepared, PreparedIngress::ActiveProxy { .. }));
    assert_eq!(*provider.listened.lock().unwrap(), vec![(443, Reachability::Funnel)]);
}

#[tokio::test]
async fn active_launch_listens_with_funnel_reachability() {
    let provider = FakeProvider::default();
    let c = config(RawConfig {
        backend: Some("8080".into()),
        funnel: Some(true),
        listen_port: Some(8443),
        ..Default::default()
    });
    let plan = IngressPlan::from_config(&c).unwrap();
    assert_eq!(plan.mode(), IngressMode::ActiveProxy);

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.trigger();
    });

    tokio::time::timeout(Duration::from_secs(5), plan.launch(&provider, &shutdown))
        .await
        .expect("server did not stop")
        .unwrap();

    assert_eq!(*provider.listened.lock().unwrap(), vec![(8443, Reachability::Funnel)]);
    assert!(provider.applied.lock().unwrap().is_empty());
}

#[test]
fn funnel_on_unsupported_port_is_rejected() {
    let errors = validate_config(RawConfig {
        hostname: Some("web".into()),
        backend: Some("8080".into()),
        funnel: Some(true),
        listen_port: Some(80),
        ..Default::default()
    })
    .unwrap_err();

    assert!(errors.contains(&ValidationError::FunnelPort(80)));
}

#[test]
fn declarative_mode_with_funnel_is_rejected() {
    let c = config(RawConfig {
        backend: Some("8080".into()),
        funnel: Some(true),
        mode: Some(ModeChoice::Declarative),
        ..Default::default()
    });

    assert!(matches!(
        IngressPlan::from_config(&c),
        Err(StartupError::Unsupported(_))
    ));
}
