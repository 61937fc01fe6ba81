//! Lifecycle trigger kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of lifecycle points a class trigger may bind to.
///
/// Serialized in camelCase on the wire (`"beforeSave"`, `"afterDelete"`, ...)
/// to match the persisted hook record format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerKind {
    BeforeFind,
    BeforeSave,
    AfterSave,
    BeforeDelete,
    AfterDelete,
}

impl TriggerKind {
    /// All trigger kinds, for registry sweeps.
    pub const ALL: &'static [TriggerKind] = &[
        TriggerKind::BeforeFind,
        TriggerKind::BeforeSave,
        TriggerKind::AfterSave,
        TriggerKind::BeforeDelete,
        TriggerKind::AfterDelete,
    ];

    /// The wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::BeforeFind => "beforeFind",
            TriggerKind::BeforeSave => "beforeSave",
            TriggerKind::AfterSave => "afterSave",
            TriggerKind::BeforeDelete => "beforeDelete",
            TriggerKind::AfterDelete => "afterDelete",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beforeFind" => Ok(TriggerKind::BeforeFind),
            "beforeSave" => Ok(TriggerKind::BeforeSave),
            "afterSave" => Ok(TriggerKind::AfterSave),
            "beforeDelete" => Ok(TriggerKind::BeforeDelete),
            "afterDelete" => Ok(TriggerKind::AfterDelete),
            other => Err(format!("unknown trigger kind: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for kind in TriggerKind::ALL {
            assert_eq!(kind.as_str().parse::<TriggerKind>().unwrap(), *kind);
        }
    }

    #[test]
    fn serde_uses_camel_case() {
        let json = serde_json::to_string(&TriggerKind::BeforeSave).unwrap();
        assert_eq!(json, "\"beforeSave\"");
        let kind: TriggerKind = serde_json::from_str("\"afterDelete\"").unwrap();
        assert_eq!(kind, TriggerKind::AfterDelete);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!("beforeLogin".parse::<TriggerKind>().is_err());
    }
}
