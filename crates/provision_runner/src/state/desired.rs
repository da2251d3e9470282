//! Desired State - Was laut Config auf dem Host existieren soll
//!
//! Der DesiredState wird einmal beim Prozessstart aus der `.wpdev.toml`
//! gebaut und ist für die Dauer eines Laufs unveränderlich.

use std::path::PathBuf;
use std::time::Duration;

use wpdev_config::Config;

/// Der gewünschte Zustand des Hosts.
#[derive(Debug, Clone, Default)]
pub struct DesiredState {
    /// Gewünschte Pakete (Reihenfolge aus der Config, ohne Duplikate)
    pub packages: Vec<String>,
    /// Upstream-verfolgte Artefakte (clone-if-absent, sonst update)
    pub resources: Vec<DesiredResource>,
    /// Generate-once Artefakte (Keys, Zertifikate, Token)
    pub secrets: Vec<DesiredSecret>,
    /// Services die nach der Konfiguration neu gestartet werden
    pub services: Vec<String>,
    /// Verzeichnis mit SQL-Dumps (Dateistamm = Datenbankname)
    pub dump_dir: Option<PathBuf>,
    /// Einstellungen für den Netzwerk-Gate
    pub network: NetworkGateSettings,
}

impl DesiredState {
    /// Baut den DesiredState aus der geladenen Config.
    ///
    /// Pakete werden dedupliziert, die erste Nennung gewinnt. Bei TLS wird
    /// der Key vor dem Zertifikat eingereiht, weil der Zertifikats-Generator
    /// den bereits vorhandenen Key konsumiert.
    pub fn from_config(config: &Config) -> Self {
        let mut packages = Vec::new();
        for package in &config.provision.packages {
            if !packages.contains(package) {
                packages.push(package.clone());
            }
        }

        let resources = config
            .resources
            .iter()
            .map(|r| DesiredResource {
                name: r.name.clone(),
                source: r.source.clone(),
                dest: r.dest.clone(),
            })
            .collect();

        let mut secrets = Vec::new();
        if let Some(tls) = &config.tls {
            secrets.push(DesiredSecret {
                name: "tls-key".to_string(),
                path: tls.key_path.clone(),
                recipe: SecretRecipe::RsaKey { bits: tls.key_bits },
            });
            secrets.push(DesiredSecret {
                name: "tls-cert".to_string(),
                path: tls.cert_path.clone(),
                recipe: SecretRecipe::SelfSignedCert {
                    key_path: tls.key_path.clone(),
                    subject: tls.subject.clone(),
                    days: tls.days,
                },
            });
        }
        for secret in &config.secrets {
            secrets.push(DesiredSecret {
                name: secret.name.clone(),
                path: secret.path.clone(),
                recipe: SecretRecipe::RandomToken {
                    bytes: secret.bytes,
                },
            });
        }

        Self {
            packages,
            resources,
            secrets,
            services: config.provision.services.clone(),
            dump_dir: config.dumps.as_ref().map(|d| d.directory.clone()),
            network: NetworkGateSettings {
                probe_url: config.network.probe_url.clone(),
                attempts: config.network.attempts,
                timeout: Duration::from_secs(config.network.timeout_secs),
            },
        }
    }
}

/// Ein upstream-verfolgtes Artefakt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredResource {
    pub name: String,
    /// Upstream-Quelle (git URL)
    pub source: String,
    /// Lokaler Zielpfad
    pub dest: PathBuf,
}

/// Ein Artefakt das einmal generiert und danach wiederverwendet wird.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredSecret {
    pub name: String,
    pub path: PathBuf,
    pub recipe: SecretRecipe,
}

/// Rezept für die Generierung eines Secrets.
///
/// Generierung ist teuer bzw. nicht deterministisch und darf nie wiederholt
/// werden sobald das Artefakt existiert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretRecipe {
    /// Privater RSA-Key
    RsaKey { bits: u32 },
    /// Selbstsigniertes Zertifikat für einen existierenden Key
    SelfSignedCert {
        key_path: PathBuf,
        subject: String,
        days: u32,
    },
    /// Zufälliges Token (hex-kodiert)
    RandomToken { bytes: u32 },
}

/// Einstellungen für den Connectivity-Check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkGateSettings {
    pub probe_url: String,
    pub attempts: u32,
    pub timeout: Duration,
}

impl Default for NetworkGateSettings {
    fn default() -> Self {
        Self {
            probe_url: String::new(),
            attempts: 3,
            timeout: Duration::from_secs(5),
        }
    }
}
