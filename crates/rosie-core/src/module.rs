use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::schema::columns;

/// A source of reimbursements with its own adapter and classifier set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Module {
    ChamberOfDeputies,
    FederalSenate,
}

impl Module {
    pub const ALL: [Module; 2] = [Module::ChamberOfDeputies, Module::FederalSenate];

    /// Name used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChamberOfDeputies => "chamber-of-deputies",
            Self::FederalSenate => "federal-senate",
        }
    }

    /// Sub-directory name used when several modules share a data path.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::ChamberOfDeputies => "chamber_of_deputies",
            Self::FederalSenate => "federal_senate",
        }
    }

    /// Columns identifying one reimbursement; they lead every suspicions row.
    pub fn unique_ids(&self) -> &'static [&'static str] {
        match self {
            Self::ChamberOfDeputies => &[columns::APPLICANT_ID, columns::YEAR, columns::DOCUMENT_ID],
            Self::FederalSenate => &[columns::YEAR, columns::DOCUMENT_ID],
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('_', "-").as_str() {
            "chamber-of-deputies" => Ok(Self::ChamberOfDeputies),
            "federal-senate" => Ok(Self::FederalSenate),
            other => Err(format!("unknown module '{other}'")),
        }
    }
}
