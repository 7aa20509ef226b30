//! Static per-switch configuration loading (C8).
//!
//! Parses `configs/switch<ID>.cfg`: a bridge priority on line 1, followed by
//! one port per remaining line. The format itself is fixed and line-based
//! (no comments, no structured encoding), so this is a hand-written parser
//! rather than something routed through a serialization crate.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

const ACCESS_PREFIX: &str = "r-";
const TRUNK_PREFIX: &str = "rr-";
pub const MIN_VLAN: u16 = 1;
pub const MAX_VLAN: u16 = 4094;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config file {path} is empty; expected a bridge priority on line 1")]
    MissingPriorityLine { path: PathBuf },
    #[error("bridge priority {value:?} on line 1 of {path} is not a valid decimal integer")]
    BadPriority { path: PathBuf, value: String },
    #[error("line {line} of {path} is blank where a port definition was expected")]
    EmptyPortLine { path: PathBuf, line: usize },
    #[error(
        "port {name:?} on line {line} of {path} has prefix {ACCESS_PREFIX:?} but no VLAN field"
    )]
    MissingVlan {
        path: PathBuf,
        line: usize,
        name: String,
    },
    #[error("VLAN {value:?} for port {name:?} on line {line} of {path} is not a valid integer")]
    BadVlan {
        path: PathBuf,
        line: usize,
        name: String,
        value: String,
    },
    #[error(
        "VLAN {vlan} for port {name:?} on line {line} of {path} is out of range [{MIN_VLAN}, {MAX_VLAN}]"
    )]
    VlanOutOfRange {
        path: PathBuf,
        line: usize,
        name: String,
        vlan: u16,
    },
    #[error(
        "port name {name:?} on line {line} of {path} has neither the {ACCESS_PREFIX:?} nor {TRUNK_PREFIX:?} prefix"
    )]
    UnrecognizedPortPrefix {
        path: PathBuf,
        line: usize,
        name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    Access { vlan: u16 },
    Trunk,
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortKind::Access { vlan } => write!(f, "access(vlan={vlan})"),
            PortKind::Trunk => write!(f, "trunk"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortConfig {
    pub name: String,
    pub kind: PortKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchConfig {
    pub bridge_priority: u64,
    pub ports: Vec<PortConfig>,
}

/// Loads `<dir>/switch<switch_id>.cfg`.
pub fn load(dir: &Path, switch_id: &str) -> Result<SwitchConfig, ConfigError> {
    let path = dir.join(format!("switch{switch_id}.cfg"));
    let text = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    parse(&text, &path)
}

fn parse(text: &str, path: &Path) -> Result<SwitchConfig, ConfigError> {
    let mut lines = text.lines();

    let priority_line = lines
        .next()
        .ok_or_else(|| ConfigError::MissingPriorityLine {
            path: path.to_path_buf(),
        })?;
    let bridge_priority =
        priority_line
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::BadPriority {
                path: path.to_path_buf(),
                value: priority_line.to_string(),
            })?;

    let mut ports = Vec::new();
    for (idx, raw_line) in lines.enumerate() {
        let line_no = idx + 2; // line 1 was the priority
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        let name = parts.next().ok_or_else(|| ConfigError::EmptyPortLine {
            path: path.to_path_buf(),
            line: line_no,
        })?;

        let kind = if name.starts_with(ACCESS_PREFIX) {
            let vlan_str = parts.next().ok_or_else(|| ConfigError::MissingVlan {
                path: path.to_path_buf(),
                line: line_no,
                name: name.to_string(),
            })?;
            let vlan = vlan_str.parse::<u16>().map_err(|_| ConfigError::BadVlan {
                path: path.to_path_buf(),
                line: line_no,
                name: name.to_string(),
                value: vlan_str.to_string(),
            })?;
            if !(MIN_VLAN..=MAX_VLAN).contains(&vlan) {
                return Err(ConfigError::VlanOutOfRange {
                    path: path.to_path_buf(),
                    line: line_no,
                    name: name.to_string(),
                    vlan,
                });
            }
            PortKind::Access { vlan }
        } else if name.starts_with(TRUNK_PREFIX) {
            PortKind::Trunk
        } else {
            return Err(ConfigError::UnrecognizedPortPrefix {
                path: path.to_path_buf(),
                line: line_no,
                name: name.to_string(),
            });
        };

        ports.push(PortConfig {
            name: name.to_string(),
            kind,
        });
    }

    Ok(SwitchConfig {
        bridge_priority,
        ports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(text: &str) -> Result<SwitchConfig, ConfigError> {
        parse(text, Path::new("configs/switch0.cfg"))
    }

    #[test]
    fn parses_priority_and_mixed_ports() {
        let cfg = parse_str("10\nr-0 1\nr-1 1\nrr-2\n").unwrap();
        assert_eq!(cfg.bridge_priority, 10);
        assert_eq!(
            cfg.ports,
            vec![
                PortConfig {
                    name: "r-0".into(),
                    kind: PortKind::Access { vlan: 1 }
                },
                PortConfig {
                    name: "r-1".into(),
                    kind: PortKind::Access { vlan: 1 }
                },
                PortConfig {
                    name: "rr-2".into(),
                    kind: PortKind::Trunk
                },
            ]
        );
    }

    #[test]
    fn skips_blank_lines() {
        let cfg = parse_str("10\nr-0 1\n\nrr-1\n").unwrap();
        assert_eq!(cfg.ports.len(), 2);
    }

    #[test]
    fn rejects_missing_priority() {
        assert!(matches!(
            parse_str(""),
            Err(ConfigError::MissingPriorityLine { .. })
        ));
    }

    #[test]
    fn rejects_non_numeric_priority() {
        assert!(matches!(
            parse_str("not-a-number\n"),
            Err(ConfigError::BadPriority { .. })
        ));
    }

    #[test]
    fn rejects_access_port_missing_vlan() {
        assert!(matches!(
            parse_str("10\nr-0\n"),
            Err(ConfigError::MissingVlan { .. })
        ));
    }

    #[test]
    fn rejects_vlan_out_of_range() {
        assert!(matches!(
            parse_str("10\nr-0 4095\n"),
            Err(ConfigError::VlanOutOfRange { .. })
        ));
        assert!(matches!(
            parse_str("10\nr-0 0\n"),
            Err(ConfigError::VlanOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_unrecognized_prefix() {
        assert!(matches!(
            parse_str("10\neth0 1\n"),
            Err(ConfigError::UnrecognizedPortPrefix { .. })
        ));
    }

    #[test]
    fn trunk_port_ignores_trailing_fields() {
        let cfg = parse_str("10\nrr-0\n").unwrap();
        assert_eq!(cfg.ports[0].kind, PortKind::Trunk);
    }
}
