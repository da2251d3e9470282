//! Pipeline - Die feste, handgeordnete Stage-Abfolge
//!
//! Reihenfolge: Netzwerk-Gate, Pakete, Resources, Secrets, Services,
//! Dumps. Die Abhängigkeiten sind fest verdrahtet (Pakete vor Service-
//! Restart, Services vor Dump-Import). Es läuft nichts parallel: jede
//! Stage mutiert geteilten Host-Zustand, die Reihenfolge ist Teil der
//! Korrektheit.
//!
//! Eine fehlgeschlagene Stage wird protokolliert, der Lauf geht weiter.
//! Einzige Ausnahme ist das Netzwerk-Gate: ohne Netz bricht der gesamte
//! Lauf bewusst mit einem eigenen Ergebnis ab - das ist Degradierung,
//! kein Fehler.

use std::sync::Arc;

use wpdev_netcheck::{check_connectivity, ConnectivityProbe};

use crate::dumps::import_all;
use crate::reconcile::{plan_packages, Action};
use crate::secrets::ensure_all;
use crate::state::{DesiredState, ObservedPackages};
use crate::sync::sync_resource;
use crate::{HostBackend, ProvisionUI, StageError};

const STAGE_PACKAGES: &str = "packages";
const STAGE_RESOURCES: &str = "resources";
const STAGE_SECRETS: &str = "secrets";
const STAGE_SERVICES: &str = "services";
const STAGE_DUMPS: &str = "dumps";

/// Optionen für einen Provisioning-Lauf.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvisionOptions {
    /// Netzwerk-Gate überspringen (Host gilt als online)
    pub skip_network: bool,
    /// Dump-Import überspringen
    pub skip_dumps: bool,
}

/// Das Endergebnis eines Laufs.
///
/// Niemals ein nackter Fehlschlag: wenn Stages scheitern, steht jede
/// einzelne mit ihrem Grund im Report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionReport {
    /// Alle Stages liefen durch
    Completed,
    /// Kein Netz erreichbar - Lauf bewusst vorzeitig beendet
    CompletedWithoutNetwork,
    /// Lauf beendet, aber mindestens eine Stage ist gescheitert
    CompletedWithFailures(Vec<StageFailure>),
}

impl ProvisionReport {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::CompletedWithFailures(_))
    }

    /// Die Namen der gescheiterten Stages (leer bei Erfolg).
    pub fn failed_stages(&self) -> Vec<&str> {
        match self {
            Self::CompletedWithFailures(failures) => {
                failures.iter().map(|f| f.stage.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Eine gescheiterte Stage mit Begründung.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: String,
    pub reason: String,
}

impl StageFailure {
    fn new(stage: &str, reason: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            reason: reason.into(),
        }
    }
}

/// Führt den kompletten Provisioning-Lauf aus.
///
/// Der Plan wird bei jedem Lauf von Grund auf neu berechnet; jede Stage
/// erhebt ihren Ist-Zustand unmittelbar vor der Entscheidung frisch.
/// Dadurch erreicht ein erneuter Lauf nach einer Unterbrechung denselben
/// Endzustand.
pub async fn run_provision<H, P, U>(
    host: Arc<H>,
    net: &P,
    desired: &DesiredState,
    options: ProvisionOptions,
    ui: &mut U,
) -> ProvisionReport
where
    H: HostBackend,
    P: ConnectivityProbe + ?Sized,
    U: ProvisionUI,
{
    let run_dumps = !options.skip_dumps && desired.dump_dir.is_some();
    ui.on_start(4 + usize::from(run_dumps));

    if !options.skip_network {
        ui.on_network_check(&desired.network.probe_url, desired.network.attempts);
        let connectivity = check_connectivity(net, desired.network.attempts).await;
        if !connectivity.is_reachable() {
            ui.on_offline();
            let report = ProvisionReport::CompletedWithoutNetwork;
            ui.on_complete(&report);
            return report;
        }
    }

    let mut failures: Vec<StageFailure> = Vec::new();
    let host = host.as_ref();

    // Pakete zuerst: alles Weitere setzt installierte Werkzeuge voraus
    ui.on_stage_start(STAGE_PACKAGES);
    if let Err(err) = stage_packages(host, desired, ui).await {
        ui.on_stage_failed(STAGE_PACKAGES, &err);
        failures.push(StageFailure::new(STAGE_PACKAGES, err.to_string()));
    }

    ui.on_stage_start(STAGE_RESOURCES);
    for resource in &desired.resources {
        if let Err(err) = sync_resource(host, resource, ui).await {
            ui.on_stage_failed(STAGE_RESOURCES, &err);
            failures.push(StageFailure::new(STAGE_RESOURCES, err.to_string()));
        }
    }

    ui.on_stage_start(STAGE_SECRETS);
    if let Err(err) = ensure_all(host, &desired.secrets, ui).await {
        ui.on_stage_failed(STAGE_SECRETS, &err);
        failures.push(StageFailure::new(STAGE_SECRETS, err.to_string()));
    }

    // Restart nach der Konfiguration, vor dem Import: mysql muss laufen
    ui.on_stage_start(STAGE_SERVICES);
    for service in &desired.services {
        ui.on_service_restart(service);
        if let Err(err) = host.restart_service(service).await {
            let err = StageError::from(err);
            ui.on_stage_failed(STAGE_SERVICES, &err);
            failures.push(StageFailure::new(
                STAGE_SERVICES,
                format!("{service}: {err}"),
            ));
        }
    }

    if run_dumps {
        ui.on_stage_start(STAGE_DUMPS);
        if let Err(err) = stage_dumps(host, desired, ui, &mut failures).await {
            ui.on_stage_failed(STAGE_DUMPS, &err);
            failures.push(StageFailure::new(STAGE_DUMPS, err.to_string()));
        }
    }

    let report = if failures.is_empty() {
        ProvisionReport::Completed
    } else {
        ProvisionReport::CompletedWithFailures(failures)
    };
    ui.on_complete(&report);
    report
}

/// Paket-Stage: frisch proben, diffen, einmal gebatcht installieren.
async fn stage_packages<H: HostBackend, U: ProvisionUI>(
    host: &H,
    desired: &DesiredState,
    ui: &mut U,
) -> Result<(), StageError> {
    if desired.packages.is_empty() {
        ui.on_action(&Action::skip(STAGE_PACKAGES, "no packages configured"));
        return Ok(());
    }

    let observed = match host.installed_packages().await {
        Ok(installed) => ObservedPackages::new(installed),
        Err(err) => {
            // Konservativer Fallback: der Batch-Install ist idempotent,
            // also gilt bei kaputter Probe alles als fehlend
            ui.on_probe_degraded(STAGE_PACKAGES, &err.to_string());
            ObservedPackages::default()
        }
    };

    let action = plan_packages(&desired.packages, &observed);
    ui.on_action(&action);

    if let Action::Install { packages } = action {
        host.install_packages(&packages).await?;
    }
    Ok(())
}

/// Dump-Stage: Verzeichnis prüfen, dann jede Datei isoliert abarbeiten.
async fn stage_dumps<H: HostBackend, U: ProvisionUI>(
    host: &H,
    desired: &DesiredState,
    ui: &mut U,
    failures: &mut Vec<StageFailure>,
) -> Result<(), StageError> {
    let dump_dir = match &desired.dump_dir {
        Some(dir) => dir,
        None => return Ok(()),
    };

    if !host.path_exists(dump_dir).await {
        ui.on_action(&Action::skip(STAGE_DUMPS, "dump directory not present"));
        return Ok(());
    }

    let reports = import_all(host, dump_dir, ui).await?;
    for report in &reports {
        if let crate::dumps::DumpOutcome::Failed { reason } = &report.outcome {
            let err = StageError::Import {
                database: report.database.clone(),
                reason: reason.clone(),
            };
            ui.on_stage_failed(STAGE_DUMPS, &err);
            failures.push(StageFailure::new(STAGE_DUMPS, err.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockHost, MockUI, StaticProbe};
    use wpdev_config::Config;

    fn desired_from(toml: &str) -> DesiredState {
        let config: Config = toml::from_str(toml).unwrap();
        DesiredState::from_config(&config)
    }

    fn full_desired() -> DesiredState {
        desired_from(
            r#"
            [provision]
            packages = ["nginx", "mysql-server"]
            services = ["mysql"]

            [[resource]]
            name = "wordpress"
            source = "https://github.com/WordPress/WordPress.git"
            dest = "/var/www/wordpress"

            [tls]
            key_path = "/etc/ssl/private/dev.key"
            cert_path = "/etc/ssl/certs/dev.crt"

            [dumps]
            directory = "/srv/dumps"
            "#,
        )
    }

    #[tokio::test]
    async fn test_empty_desired_state_completes() {
        let host = Arc::new(MockHost::new());
        let mut ui = MockUI::new();

        let report = run_provision(
            host.clone(),
            &StaticProbe::reachable(),
            &DesiredState::default(),
            ProvisionOptions::default(),
            &mut ui,
        )
        .await;

        assert_eq!(report, ProvisionReport::Completed);
        assert!(host.installed().is_empty());
    }

    #[tokio::test]
    async fn test_offline_short_circuits_whole_run() {
        let host = Arc::new(MockHost::new());
        let mut ui = MockUI::new();

        let report = run_provision(
            host.clone(),
            &StaticProbe::unreachable(),
            &full_desired(),
            ProvisionOptions::default(),
            &mut ui,
        )
        .await;

        assert_eq!(report, ProvisionReport::CompletedWithoutNetwork);
        assert!(report.is_success());
        // Gar nichts wurde angefasst, auch keine netz-unabhängigen Stages
        assert!(host.installed().is_empty());
        assert!(host.generated().is_empty());
        assert!(host.restarted().is_empty());
        assert!(ui.events.contains(&"offline".to_string()));
    }

    #[tokio::test]
    async fn test_skip_network_bypasses_gate() {
        let host = Arc::new(MockHost::new());
        host.add_database("wordpress", 0);
        let mut ui = MockUI::new();

        let report = run_provision(
            host.clone(),
            &StaticProbe::unreachable(),
            &full_desired(),
            ProvisionOptions {
                skip_network: true,
                skip_dumps: false,
            },
            &mut ui,
        )
        .await;

        assert_eq!(report, ProvisionReport::Completed);
        assert_eq!(host.installed().len(), 1);
    }

    #[tokio::test]
    async fn test_first_run_executes_all_stages() {
        let host = Arc::new(MockHost::new());
        host.add_path("/srv/dumps");
        host.add_database("wordpress", 0);
        host.add_dump_file("/srv/dumps/wordpress.sql");
        let mut ui = MockUI::new();

        let report = run_provision(
            host.clone(),
            &StaticProbe::reachable(),
            &full_desired(),
            ProvisionOptions::default(),
            &mut ui,
        )
        .await;

        assert_eq!(report, ProvisionReport::Completed);
        assert_eq!(host.installed(), vec![vec![
            "nginx".to_string(),
            "mysql-server".to_string()
        ]]);
        assert_eq!(host.cloned().len(), 1);
        assert_eq!(host.generated().len(), 2);
        assert_eq!(host.restarted(), vec!["mysql".to_string()]);
        assert_eq!(host.imported().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_stage_does_not_stop_the_run() {
        let host = Arc::new(MockHost::new());
        host.add_path("/var/www/wordpress");
        host.set_update_conflict("/var/www/wordpress", "local commits diverge");
        let mut ui = MockUI::new();

        let report = run_provision(
            host.clone(),
            &StaticProbe::reachable(),
            &full_desired(),
            ProvisionOptions::default(),
            &mut ui,
        )
        .await;

        // Resources scheiterten, aber Secrets und Services liefen trotzdem
        assert_eq!(report.failed_stages(), vec!["resources"]);
        assert_eq!(host.generated().len(), 2);
        assert_eq!(host.restarted().len(), 1);
    }

    #[tokio::test]
    async fn test_report_names_every_failed_stage() {
        let host = Arc::new(MockHost::new());
        host.add_path("/var/www/wordpress");
        host.set_update_conflict("/var/www/wordpress", "local commits diverge");
        host.set_generate_failure("/etc/ssl/private/dev.key");
        let mut ui = MockUI::new();

        let report = run_provision(
            host.clone(),
            &StaticProbe::reachable(),
            &full_desired(),
            ProvisionOptions::default(),
            &mut ui,
        )
        .await;

        assert_eq!(report.failed_stages(), vec!["resources", "secrets"]);
        match report {
            ProvisionReport::CompletedWithFailures(failures) => {
                assert!(failures[0].reason.contains("wordpress"));
                assert!(failures[1].reason.contains("tls-key"));
            }
            other => panic!("expected failures, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_package_probe_failure_falls_back_to_full_install() {
        let host = Arc::new(MockHost::new());
        host.add_package("nginx", "1.18.0");
        host.set_package_probe_failure();
        let mut ui = MockUI::new();

        let report = run_provision(
            host.clone(),
            &StaticProbe::reachable(),
            &desired_from(
                r#"
                [provision]
                packages = ["nginx", "curl"]
                "#,
            ),
            ProvisionOptions::default(),
            &mut ui,
        )
        .await;

        // Probe kaputt: kompletter Batch wird installiert (idempotent, also sicher)
        assert_eq!(report, ProvisionReport::Completed);
        assert_eq!(host.installed(), vec![vec![
            "nginx".to_string(),
            "curl".to_string()
        ]]);
        assert!(ui
            .events
            .iter()
            .any(|e| e.starts_with("probe_degraded:packages")));
    }

    #[tokio::test]
    async fn test_missing_dump_directory_is_a_skip() {
        let host = Arc::new(MockHost::new());
        host.add_database("wordpress", 0);
        let mut ui = MockUI::new();

        let report = run_provision(
            host.clone(),
            &StaticProbe::reachable(),
            &desired_from(
                r#"
                [dumps]
                directory = "/srv/dumps"
                "#,
            ),
            ProvisionOptions::default(),
            &mut ui,
        )
        .await;

        assert_eq!(report, ProvisionReport::Completed);
        assert!(host.imported().is_empty());
        assert!(ui
            .events
            .iter()
            .any(|e| e.contains("dump directory not present")));
    }

    #[tokio::test]
    async fn test_dump_failures_are_listed_per_database() {
        let host = Arc::new(MockHost::new());
        host.add_path("/srv/dumps");
        host.add_database("orders", 0);
        host.add_dump_file("/srv/dumps/ghost.sql");
        host.add_dump_file("/srv/dumps/orders.sql");
        let mut ui = MockUI::new();

        let report = run_provision(
            host.clone(),
            &StaticProbe::reachable(),
            &desired_from(
                r#"
                [dumps]
                directory = "/srv/dumps"
                "#,
            ),
            ProvisionOptions::default(),
            &mut ui,
        )
        .await;

        assert_eq!(report.failed_stages(), vec!["dumps"]);
        match report {
            ProvisionReport::CompletedWithFailures(failures) => {
                assert!(failures[0].reason.contains("ghost"));
                assert!(failures[0].reason.contains("pre-created"));
            }
            other => panic!("expected failures, got {:?}", other),
        }
        // Der gültige Dump lief trotzdem
        assert_eq!(host.imported().len(), 1);
    }
}
