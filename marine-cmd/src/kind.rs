use std::path::Path;

use anyhow::{anyhow, Result};
use marine::section::Format;
use marine::{ctd, em, pd0, sbd, segy};

/// Supported file kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Em,
    Pd0,
    Segy,
    Ctd,
    Sbd,
}

impl clap::ValueEnum for Kind {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Em, Self::Pd0, Self::Segy, Self::Ctd, Self::Sbd]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.name()))
    }
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Em => "em",
            Self::Pd0 => "pd0",
            Self::Segy => "segy",
            Self::Ctd => "ctd",
            Self::Sbd => "sbd",
        }
    }

    /// Kind from a file extension, ignoring case.
    pub fn guess(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Some(match ext.as_str() {
            "all" => Self::Em,
            "000" | "pd0" | "ens" | "enx" | "sta" | "lta" => Self::Pd0,
            "sgy" | "segy" => Self::Segy,
            "hex" => Self::Ctd,
            "sbd" => Self::Sbd,
            _ => return None,
        })
    }

    /// The explicit kind if given, else the one guessed from `path`.
    pub fn resolve(kind: Option<Kind>, path: &Path) -> Result<Self> {
        kind.or_else(|| Self::guess(path))
            .ok_or_else(|| anyhow!("cannot tell the kind of {path:?}; use --kind"))
    }

    /// Format for `buf`, with byte order detected where the format has one.
    pub fn format(&self, buf: &[u8]) -> Box<dyn Format> {
        match self {
            Self::Em => Box::new(em::Multibeam::detect(buf)),
            Self::Pd0 => Box::new(pd0::Adcp::default()),
            Self::Segy => Box::new(segy::Seismic::detect(buf)),
            Self::Ctd => Box::new(ctd::Ctd::default()),
            Self::Sbd => Box::new(sbd::Argo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn guess_from_extension() {
        let cases = [
            ("0001_20210410.all", Some(Kind::Em)),
            ("OS38000.ENX", Some(Kind::Pd0)),
            ("ADCP001.000", Some(Kind::Pd0)),
            ("line42.segy", Some(Kind::Segy)),
            ("cast01.hex", Some(Kind::Ctd)),
            ("300234.sbd", Some(Kind::Sbd)),
            ("notes.txt", None),
            ("noext", None),
        ];
        for (name, expected) in cases {
            assert_eq!(Kind::guess(&PathBuf::from(name)), expected, "{name}");
        }
    }

    #[test]
    fn explicit_kind_wins() {
        let path = PathBuf::from("cast01.hex");
        assert_eq!(Kind::resolve(Some(Kind::Sbd), &path).unwrap(), Kind::Sbd);
        assert!(Kind::resolve(None, &PathBuf::from("x.bin")).is_err());
    }
}
