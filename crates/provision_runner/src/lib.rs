use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

pub mod dumps;
pub mod pipeline;
pub mod probe;
pub mod reconcile;
pub mod secrets;
pub mod state;
pub mod sync;

pub use dumps::{DumpOutcome, DumpReport};
pub use pipeline::{run_provision, ProvisionOptions, ProvisionReport, StageFailure};
pub use reconcile::{Action, ActionPlan};
pub use secrets::SecretOutcome;
pub use state::{
    DatabaseState, DesiredResource, DesiredSecret, DesiredState, ObservedPackages, SecretRecipe,
};
pub use sync::SyncOutcome;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Failed to execute command: {0}")]
    Execution(#[from] std::io::Error),

    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Fehler einer einzelnen Stage.
///
/// Diese Fehler werden von der Pipeline eingesammelt und beenden den Lauf
/// nicht - nur das Netzwerk-Gate darf den ganzen Lauf abbrechen, und das
/// ist kein Fehler sondern ein eigenes Ergebnis.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("Resource '{name}' could not be updated cleanly: {detail}")]
    SyncConflict { name: String, detail: String },

    #[error("Generating '{name}' failed: {detail}")]
    Generation { name: String, detail: String },

    #[error("Import into '{database}' failed: {reason}")]
    Import { database: String, reason: String },

    #[error(transparent)]
    Host(#[from] ProvisionError),
}

/// Ergebnis eines inkrementellen Resource-Updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Update sauber angewendet (oder es gab nichts zu tun)
    Clean,
    /// Upstream ließ sich nicht linear anwenden - lokale Kopie unangetastet
    Conflict(String),
}

// ============================================================================
// HostBackend Trait - abstrahiert alle Host-Zugriffe für Tests
// ============================================================================

/// Trait für sämtliche Probes und Mutationen am Host.
///
/// Der Reconciler parst nie selbst Tool-Ausgaben - alles kommt hier bereits
/// typisiert an. Ermöglicht Mocking für Tests.
#[async_trait]
pub trait HostBackend: Send + Sync {
    /// Alle installierten Pakete (Name -> Version). Reiner Lesezugriff.
    async fn installed_packages(&self) -> Result<BTreeMap<String, String>, ProvisionError>;

    /// Prüft ob ein Pfad existiert
    async fn path_exists(&self, path: &Path) -> bool;

    /// Prüft ob ein Service läuft
    async fn service_running(&self, name: &str) -> bool;

    /// Zustand einer Datenbank (fehlt / Tabellenanzahl)
    async fn database_state(&self, name: &str) -> Result<DatabaseState, ProvisionError>;

    /// Listet die Dump-Dateien eines Verzeichnisses (unsortiert)
    async fn list_dump_files(&self, dir: &Path) -> Result<Vec<PathBuf>, ProvisionError>;

    /// Installiert die komplette Liste in einem einzigen Batch
    async fn install_packages(&self, packages: &[String]) -> Result<(), ProvisionError>;

    /// Holt ein Artefakt vollständig an einen noch leeren Zielpfad
    async fn clone_resource(&self, source: &str, dest: &Path) -> Result<(), ProvisionError>;

    /// Aktualisiert ein vorhandenes Artefakt inkrementell (rebase-artig).
    /// Bei Konflikt bleibt die lokale Kopie unverändert.
    async fn update_resource(&self, dest: &Path) -> Result<UpdateOutcome, ProvisionError>;

    /// Führt das Generator-Rezept für ein Secret aus
    async fn generate_secret(&self, recipe: &SecretRecipe, path: &Path) -> Result<(), ProvisionError>;

    /// Entfernt eine Datei (fehlende Datei ist kein Fehler)
    async fn remove_file(&self, path: &Path) -> Result<(), ProvisionError>;

    /// Importiert einen Dump in eine existierende, leere Datenbank.
    /// Schlägt der Import fehl, bleibt die Datenbank leer zurück.
    async fn import_dump(&self, database: &str, dump: &Path) -> Result<(), ProvisionError>;

    /// Startet einen Service neu
    async fn restart_service(&self, name: &str) -> Result<(), ProvisionError>;
}

// ============================================================================
// RealHost - Echte Implementierung über die System-Tools
// ============================================================================

/// Echte Host-Implementierung über dpkg/apt-get, git, openssl, mysql
/// und den Service-Manager.
#[derive(Debug, Default)]
pub struct RealHost;

impl RealHost {
    pub fn new() -> Self {
        Self
    }

    async fn run_checked(&self, program: &str, args: &[&str]) -> Result<String, ProvisionError> {
        let output = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProvisionError::CommandFailed(format!(
                "{program} {}: {}",
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Eine einzelne SQL-Abfrage, tab-separiert und ohne Header.
    async fn mysql_query(&self, sql: &str) -> Result<String, ProvisionError> {
        self.run_checked("mysql", &["-N", "-B", "-e", sql]).await
    }

    /// Räumt nach einem fehlgeschlagenen Import auf: alle bereits
    /// angelegten Tabellen werden verworfen, damit die Datenbank für den
    /// nächsten Lauf wieder als leer gilt.
    async fn drop_all_tables(&self, database: &str) -> Result<(), ProvisionError> {
        let tables = self
            .run_checked("mysql", &["-N", "-B", database, "-e", "SHOW TABLES"])
            .await?;

        let names: Vec<String> = tables
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| format!("`{}`", line.trim()))
            .collect();

        if names.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "SET FOREIGN_KEY_CHECKS=0; DROP TABLE IF EXISTS {};",
            names.join(", ")
        );
        self.run_checked("mysql", &[database, "-e", &sql]).await?;
        Ok(())
    }
}

#[async_trait]
impl HostBackend for RealHost {
    async fn installed_packages(&self) -> Result<BTreeMap<String, String>, ProvisionError> {
        let output = self
            .run_checked(
                "dpkg-query",
                &["-W", "-f=${db:Status-Status}\\t${Package}\\t${Version}\\n"],
            )
            .await?;
        Ok(probe::parse_installed_packages(&output))
    }

    async fn path_exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn service_running(&self, name: &str) -> bool {
        Command::new("service")
            .args([name, "status"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    async fn database_state(&self, name: &str) -> Result<DatabaseState, ProvisionError> {
        let exists = self
            .mysql_query(&format!(
                "SELECT COUNT(*) FROM information_schema.schemata WHERE schema_name = '{name}'"
            ))
            .await?;
        if probe::parse_count(&exists)? == 0 {
            return Ok(DatabaseState::Missing);
        }

        let tables = self
            .mysql_query(&format!(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = '{name}'"
            ))
            .await?;
        Ok(DatabaseState::Tables(probe::parse_count(&tables)?))
    }

    async fn list_dump_files(&self, dir: &Path) -> Result<Vec<PathBuf>, ProvisionError> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|ext| ext == "sql").unwrap_or(false) {
                files.push(path);
            }
        }

        Ok(files)
    }

    async fn install_packages(&self, packages: &[String]) -> Result<(), ProvisionError> {
        let output = Command::new("apt-get")
            .arg("install")
            .arg("-y")
            .args(packages)
            .env("DEBIAN_FRONTEND", "noninteractive")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProvisionError::CommandFailed(format!(
                "apt-get install: {}",
                stderr.trim()
            )));
        }
        Ok(())
    }

    async fn clone_resource(&self, source: &str, dest: &Path) -> Result<(), ProvisionError> {
        let dest = dest.to_string_lossy().to_string();
        self.run_checked("git", &["clone", source, &dest]).await?;
        Ok(())
    }

    async fn update_resource(&self, dest: &Path) -> Result<UpdateOutcome, ProvisionError> {
        let dest_str = dest.to_string_lossy().to_string();
        let output = Command::new("git")
            .args(["-C", &dest_str, "pull", "--rebase"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if output.status.success() {
            return Ok(UpdateOutcome::Clean);
        }

        // Niemals forcieren: angefangenen Rebase zurücknehmen und melden
        let _ = Command::new("git")
            .args(["-C", &dest_str, "rebase", "--abort"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(UpdateOutcome::Conflict(stderr.trim().to_string()))
    }

    async fn generate_secret(&self, recipe: &SecretRecipe, path: &Path) -> Result<(), ProvisionError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let path_str = path.to_string_lossy().to_string();
        match recipe {
            SecretRecipe::RsaKey { bits } => {
                let bits = bits.to_string();
                self.run_checked("openssl", &["genrsa", "-out", &path_str, &bits])
                    .await?;
            }
            SecretRecipe::SelfSignedCert {
                key_path,
                subject,
                days,
            } => {
                let key = key_path.to_string_lossy().to_string();
                let days = days.to_string();
                self.run_checked(
                    "openssl",
                    &[
                        "req", "-new", "-x509", "-key", &key, "-out", &path_str, "-subj",
                        subject, "-days", &days,
                    ],
                )
                .await?;
            }
            SecretRecipe::RandomToken { bytes } => {
                let bytes = bytes.to_string();
                self.run_checked("openssl", &["rand", "-hex", "-out", &path_str, &bytes])
                    .await?;
            }
        }
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> Result<(), ProvisionError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn import_dump(&self, database: &str, dump: &Path) -> Result<(), ProvisionError> {
        let file = std::fs::File::open(dump)?;
        let output = Command::new("mysql")
            .arg(database)
            .stdin(Stdio::from(file))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            // Halber Import darf nicht als "Daten vorhanden" durchgehen
            let _ = self.drop_all_tables(database).await;
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProvisionError::CommandFailed(format!(
                "mysql import into '{database}': {}",
                stderr.trim()
            )));
        }
        Ok(())
    }

    async fn restart_service(&self, name: &str) -> Result<(), ProvisionError> {
        self.run_checked("service", &[name, "restart"]).await?;
        Ok(())
    }
}

// ============================================================================
// ProvisionUI Trait - abstrahiert die Konsolen-Ausgabe
// ============================================================================

/// Trait für alle Meldungen während des Laufs.
/// Ermöglicht einheitliche Logik für Headless-Ausgabe und Tests.
pub trait ProvisionUI {
    /// Wird einmal beim Start aufgerufen
    fn on_start(&mut self, stage_count: usize);

    /// Wird vor dem Connectivity-Check aufgerufen
    fn on_network_check(&mut self, url: &str, attempts: u32);

    /// Wird aufgerufen wenn kein Netz erreichbar ist
    fn on_offline(&mut self);

    /// Wird beim Beginn jeder Stage aufgerufen
    fn on_stage_start(&mut self, stage: &str);

    /// Wird für jede ausgeführte (oder übersprungene) Action aufgerufen
    fn on_action(&mut self, action: &Action);

    /// Wird aufgerufen wenn eine Probe scheiterte und die Stage degradiert weiterläuft
    fn on_probe_degraded(&mut self, stage: &str, detail: &str);

    /// Wird vor jedem Service-Restart aufgerufen
    fn on_service_restart(&mut self, service: &str);

    /// Wird für jedes Dump-Ergebnis aufgerufen
    fn on_dump_outcome(&mut self, report: &DumpReport);

    /// Wird bei Stage-Fehlern aufgerufen
    fn on_stage_failed(&mut self, stage: &str, error: &StageError);

    /// Wird einmal am Ende mit dem Gesamtergebnis aufgerufen
    fn on_complete(&mut self, report: &ProvisionReport);
}

// ============================================================================
// HeadlessUI - println!-basierte Ausgabe
// ============================================================================

/// Headless UI implementation using println!
pub struct HeadlessUI;

impl ProvisionUI for HeadlessUI {
    fn on_start(&mut self, stage_count: usize) {
        println!("Provisioning {} stage(s)", stage_count);
    }

    fn on_network_check(&mut self, url: &str, attempts: u32) {
        println!("Checking connectivity against {url} ({attempts} attempt(s))...");
    }

    fn on_offline(&mut self) {
        println!("No network reachable, stopping here. Re-run once the host is online.");
    }

    fn on_stage_start(&mut self, stage: &str) {
        println!("\n=== {stage} ===");
    }

    fn on_action(&mut self, action: &Action) {
        match action {
            Action::Install { packages } => {
                println!("  Installing {} package(s): {}", packages.len(), packages.join(" "));
            }
            Action::Clone { name, source, dest } => {
                println!("  Cloning {name} from {source} into {}", dest.display());
            }
            Action::Pull { name, dest } => {
                println!("  Updating {name} at {}", dest.display());
            }
            Action::Generate { name, path } => {
                println!("  Generating {name} at {}", path.display());
            }
            Action::Import { database, file } => {
                println!("  Importing {} into '{database}'", file.display());
            }
            Action::Skip { target, reason } => {
                println!("  {target}: {reason}");
            }
        }
    }

    fn on_probe_degraded(&mut self, stage: &str, detail: &str) {
        eprintln!("  Probe degraded in stage '{stage}': {detail}");
    }

    fn on_service_restart(&mut self, service: &str) {
        println!("  Restarting {service}...");
    }

    fn on_dump_outcome(&mut self, report: &DumpReport) {
        match &report.outcome {
            DumpOutcome::Imported => println!("  {}: imported", report.database),
            DumpOutcome::Skipped { tables } => {
                println!("  {}: skipped ({} table(s) present)", report.database, tables);
            }
            DumpOutcome::Failed { reason } => {
                eprintln!("  {}: failed: {}", report.database, reason);
            }
        }
    }

    fn on_stage_failed(&mut self, stage: &str, error: &StageError) {
        eprintln!("  Stage '{stage}' failed: {error}");
    }

    fn on_complete(&mut self, report: &ProvisionReport) {
        match report {
            ProvisionReport::Completed => println!("\nProvisioning complete."),
            ProvisionReport::CompletedWithoutNetwork => {
                println!("\nProvisioning finished without network.");
            }
            ProvisionReport::CompletedWithFailures(failures) => {
                println!("\nProvisioning finished with {} failed stage(s):", failures.len());
                for failure in failures {
                    println!("  - {}: {}", failure.stage, failure.reason);
                }
            }
        }
    }
}

// ============================================================================
// Test Utilities - exportiert für Integrationstests
// ============================================================================

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Mock-Probe mit festem Ergebnis.
    pub struct StaticProbe {
        reachable: bool,
    }

    impl StaticProbe {
        pub fn reachable() -> Self {
            Self { reachable: true }
        }

        pub fn unreachable() -> Self {
            Self { reachable: false }
        }
    }

    #[async_trait]
    impl wpdev_netcheck::ConnectivityProbe for StaticProbe {
        async fn probe_once(&self) -> bool {
            self.reachable
        }
    }

    /// Mock-Host für Tests.
    ///
    /// Modelliert einen echten Host: Mutationen verändern den beobachtbaren
    /// Zustand, damit Folge-Probes frische Ergebnisse sehen.
    #[derive(Default)]
    pub struct MockHost {
        packages: Mutex<BTreeMap<String, String>>,
        paths: Mutex<HashSet<PathBuf>>,
        running_services: Mutex<HashSet<String>>,
        databases: Mutex<BTreeMap<String, u64>>,
        dump_files: Mutex<Vec<PathBuf>>,

        install_calls: Mutex<Vec<Vec<String>>>,
        clone_calls: Mutex<Vec<(String, PathBuf)>>,
        update_calls: Mutex<Vec<PathBuf>>,
        generate_calls: Mutex<Vec<PathBuf>>,
        import_calls: Mutex<Vec<(String, PathBuf)>>,
        restart_calls: Mutex<Vec<String>>,
        remove_calls: Mutex<Vec<PathBuf>>,

        package_probe_broken: Mutex<bool>,
        db_probe_failures: Mutex<HashSet<String>>,
        update_conflicts: Mutex<BTreeMap<PathBuf, String>>,
        generate_failures: Mutex<HashSet<PathBuf>>,
        import_failures: Mutex<HashSet<String>>,
    }

    impl MockHost {
        pub fn new() -> Self {
            Self::default()
        }

        // --- Setup ---

        pub fn add_package(&self, name: &str, version: &str) {
            self.packages
                .lock()
                .unwrap()
                .insert(name.to_string(), version.to_string());
        }

        pub fn add_path(&self, path: &str) {
            self.paths.lock().unwrap().insert(PathBuf::from(path));
        }

        pub fn add_running_service(&self, name: &str) {
            self.running_services.lock().unwrap().insert(name.to_string());
        }

        pub fn add_database(&self, name: &str, tables: u64) {
            self.databases.lock().unwrap().insert(name.to_string(), tables);
        }

        pub fn add_dump_file(&self, path: &str) {
            self.dump_files.lock().unwrap().push(PathBuf::from(path));
        }

        // --- Fehler-Szenarien ---

        pub fn set_package_probe_failure(&self) {
            *self.package_probe_broken.lock().unwrap() = true;
        }

        pub fn set_database_probe_failure(&self, name: &str) {
            self.db_probe_failures.lock().unwrap().insert(name.to_string());
        }

        pub fn set_update_conflict(&self, dest: &str, detail: &str) {
            self.update_conflicts
                .lock()
                .unwrap()
                .insert(PathBuf::from(dest), detail.to_string());
        }

        pub fn set_generate_failure(&self, path: &str) {
            self.generate_failures.lock().unwrap().insert(PathBuf::from(path));
        }

        pub fn set_import_failure(&self, database: &str) {
            self.import_failures.lock().unwrap().insert(database.to_string());
        }

        // --- Aufzeichnungen ---

        pub fn installed(&self) -> Vec<Vec<String>> {
            self.install_calls.lock().unwrap().clone()
        }

        pub fn cloned(&self) -> Vec<(String, PathBuf)> {
            self.clone_calls.lock().unwrap().clone()
        }

        pub fn updated(&self) -> Vec<PathBuf> {
            self.update_calls.lock().unwrap().clone()
        }

        pub fn generated(&self) -> Vec<PathBuf> {
            self.generate_calls.lock().unwrap().clone()
        }

        pub fn imported(&self) -> Vec<(String, PathBuf)> {
            self.import_calls.lock().unwrap().clone()
        }

        pub fn restarted(&self) -> Vec<String> {
            self.restart_calls.lock().unwrap().clone()
        }

        pub fn removed(&self) -> Vec<PathBuf> {
            self.remove_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HostBackend for MockHost {
        async fn installed_packages(&self) -> Result<BTreeMap<String, String>, ProvisionError> {
            if *self.package_probe_broken.lock().unwrap() {
                return Err(ProvisionError::CommandFailed(
                    "dpkg-query unavailable".to_string(),
                ));
            }
            Ok(self.packages.lock().unwrap().clone())
        }

        async fn path_exists(&self, path: &Path) -> bool {
            self.paths.lock().unwrap().contains(path)
        }

        async fn service_running(&self, name: &str) -> bool {
            self.running_services.lock().unwrap().contains(name)
        }

        async fn database_state(&self, name: &str) -> Result<DatabaseState, ProvisionError> {
            if self.db_probe_failures.lock().unwrap().contains(name) {
                return Err(ProvisionError::CommandFailed(format!(
                    "mysql probe for '{name}' failed"
                )));
            }
            Ok(match self.databases.lock().unwrap().get(name) {
                Some(tables) => DatabaseState::Tables(*tables),
                None => DatabaseState::Missing,
            })
        }

        async fn list_dump_files(&self, _dir: &Path) -> Result<Vec<PathBuf>, ProvisionError> {
            Ok(self.dump_files.lock().unwrap().clone())
        }

        async fn install_packages(&self, packages: &[String]) -> Result<(), ProvisionError> {
            self.install_calls.lock().unwrap().push(packages.to_vec());
            let mut installed = self.packages.lock().unwrap();
            for package in packages {
                installed.insert(package.clone(), "1.0".to_string());
            }
            Ok(())
        }

        async fn clone_resource(&self, source: &str, dest: &Path) -> Result<(), ProvisionError> {
            self.clone_calls
                .lock()
                .unwrap()
                .push((source.to_string(), dest.to_path_buf()));
            self.paths.lock().unwrap().insert(dest.to_path_buf());
            Ok(())
        }

        async fn update_resource(&self, dest: &Path) -> Result<UpdateOutcome, ProvisionError> {
            if let Some(detail) = self.update_conflicts.lock().unwrap().get(dest) {
                return Ok(UpdateOutcome::Conflict(detail.clone()));
            }
            self.update_calls.lock().unwrap().push(dest.to_path_buf());
            Ok(UpdateOutcome::Clean)
        }

        async fn generate_secret(&self, _recipe: &SecretRecipe, path: &Path) -> Result<(), ProvisionError> {
            if self.generate_failures.lock().unwrap().contains(path) {
                // Der kaputte Generator lässt ein halbes Artefakt zurück
                self.paths.lock().unwrap().insert(path.to_path_buf());
                return Err(ProvisionError::CommandFailed(
                    "generator exited with status 1".to_string(),
                ));
            }
            self.generate_calls.lock().unwrap().push(path.to_path_buf());
            self.paths.lock().unwrap().insert(path.to_path_buf());
            Ok(())
        }

        async fn remove_file(&self, path: &Path) -> Result<(), ProvisionError> {
            self.remove_calls.lock().unwrap().push(path.to_path_buf());
            self.paths.lock().unwrap().remove(path);
            Ok(())
        }

        async fn import_dump(&self, database: &str, dump: &Path) -> Result<(), ProvisionError> {
            if self.import_failures.lock().unwrap().contains(database) {
                // Full-or-empty: die Tabellenanzahl bleibt bei 0
                return Err(ProvisionError::CommandFailed(format!(
                    "malformed dump for '{database}'"
                )));
            }
            self.import_calls
                .lock()
                .unwrap()
                .push((database.to_string(), dump.to_path_buf()));
            self.databases.lock().unwrap().insert(database.to_string(), 5);
            Ok(())
        }

        async fn restart_service(&self, name: &str) -> Result<(), ProvisionError> {
            self.restart_calls.lock().unwrap().push(name.to_string());
            self.running_services.lock().unwrap().insert(name.to_string());
            Ok(())
        }
    }

    /// Mock UI für Tests - zeichnet alle Events auf.
    #[derive(Default)]
    pub struct MockUI {
        pub events: Vec<String>,
    }

    impl MockUI {
        pub fn new() -> Self {
            Self::default()
        }

        /// Alle aufgezeichneten Action-Events.
        pub fn actions(&self) -> Vec<&String> {
            self.events
                .iter()
                .filter(|e| e.starts_with("action:"))
                .collect()
        }
    }

    impl ProvisionUI for MockUI {
        fn on_start(&mut self, stage_count: usize) {
            self.events.push(format!("start:{stage_count}"));
        }

        fn on_network_check(&mut self, url: &str, attempts: u32) {
            self.events.push(format!("network_check:{url}:{attempts}"));
        }

        fn on_offline(&mut self) {
            self.events.push("offline".to_string());
        }

        fn on_stage_start(&mut self, stage: &str) {
            self.events.push(format!("stage_start:{stage}"));
        }

        fn on_action(&mut self, action: &Action) {
            let event = match action {
                Action::Install { packages } => format!("action:install:{}", packages.join("+")),
                Action::Clone { name, .. } => format!("action:clone:{name}"),
                Action::Pull { name, .. } => format!("action:pull:{name}"),
                Action::Generate { name, .. } => format!("action:generate:{name}"),
                Action::Import { database, .. } => format!("action:import:{database}"),
                Action::Skip { target, reason } => format!("action:skip:{target}:{reason}"),
            };
            self.events.push(event);
        }

        fn on_probe_degraded(&mut self, stage: &str, detail: &str) {
            self.events.push(format!("probe_degraded:{stage}:{detail}"));
        }

        fn on_service_restart(&mut self, service: &str) {
            self.events.push(format!("restart:{service}"));
        }

        fn on_dump_outcome(&mut self, report: &DumpReport) {
            let outcome = match &report.outcome {
                DumpOutcome::Imported => "imported".to_string(),
                DumpOutcome::Skipped { tables } => format!("skipped:{tables}"),
                DumpOutcome::Failed { reason } => format!("failed:{reason}"),
            };
            self.events.push(format!("dump:{}:{outcome}", report.database));
        }

        fn on_stage_failed(&mut self, stage: &str, _error: &StageError) {
            self.events.push(format!("stage_failed:{stage}"));
        }

        fn on_complete(&mut self, report: &ProvisionReport) {
            let event = match report {
                ProvisionReport::Completed => "complete:ok".to_string(),
                ProvisionReport::CompletedWithoutNetwork => "complete:offline".to_string(),
                ProvisionReport::CompletedWithFailures(failures) => {
                    format!("complete:failures:{}", failures.len())
                }
            };
            self.events.push(event);
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
