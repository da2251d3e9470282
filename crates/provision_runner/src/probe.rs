use std::collections::BTreeMap;

use crate::ProvisionError;

/// Parst die Ausgabe von `dpkg-query -W -f='${db:Status-Status}\t${Package}\t${Version}\n'`.
///
/// Nur Pakete mit Status "installed" landen in der Map. Alles andere
/// (entfernt-aber-konfiguriert, halb installiert) gilt als nicht installiert.
pub fn parse_installed_packages(output: &str) -> BTreeMap<String, String> {
    let mut installed = BTreeMap::new();

    for line in output.lines() {
        let mut parts = line.splitn(3, '\t');
        let status = parts.next().unwrap_or("");
        let name = parts.next().unwrap_or("");
        let version = parts.next().unwrap_or("");

        if status == "installed" && !name.is_empty() {
            installed.insert(name.to_string(), version.to_string());
        }
    }

    installed
}

/// Parst eine einzelne Zahl aus einer mysql `-N -B` Abfrage.
pub fn parse_count(output: &str) -> Result<u64, ProvisionError> {
    let trimmed = output.trim();
    trimmed.parse::<u64>().map_err(|_| {
        ProvisionError::CommandFailed(format!("unexpected query output: '{trimmed}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_installed_packages() {
        let output = "installed\tnginx\t1.18.0-6\ninstalled\tphp-fpm\t2:8.1+92\n";
        let map = parse_installed_packages(output);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("nginx").map(String::as_str), Some("1.18.0-6"));
        assert_eq!(map.get("php-fpm").map(String::as_str), Some("2:8.1+92"));
    }

    #[test]
    fn test_parse_skips_non_installed_status() {
        let output = "installed\tnginx\t1.18.0-6\nconfig-files\told-tool\t0.9\nhalf-installed\tbroken\t1.0\n";
        let map = parse_installed_packages(output);

        assert_eq!(map.len(), 1);
        assert!(map.contains_key("nginx"));
        assert!(!map.contains_key("old-tool"));
        assert!(!map.contains_key("broken"));
    }

    #[test]
    fn test_parse_tolerates_malformed_lines() {
        let output = "installed\tnginx\t1.18.0-6\n\ngarbage line without tabs\ninstalled\t\t1.0\n";
        let map = parse_installed_packages(output);

        assert_eq!(map.len(), 1);
        assert!(map.contains_key("nginx"));
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_installed_packages("").is_empty());
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("0\n").unwrap(), 0);
        assert_eq!(parse_count("  17 ").unwrap(), 17);
    }

    #[test]
    fn test_parse_count_rejects_garbage() {
        assert!(parse_count("ERROR 1049").is_err());
        assert!(parse_count("").is_err());
    }
}
