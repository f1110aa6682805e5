use std::io::Read;

use serde::{Deserialize, Deserializer};

use super::domain::{BaseScore, Ein};

/// One institution queued for a batch scoring run.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortMember {
    pub name: String,
    pub ein: Ein,
    pub base_score: Option<BaseScore>,
}

/// Error raised while reading a cohort CSV.
#[derive(Debug, thiserror::Error)]
pub enum CohortImportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("row {row} is missing an institution name")]
    MissingName { row: usize },
    #[error("row {row} is missing an EIN")]
    MissingEin { row: usize },
}

/// Parse a cohort CSV with `Name`, `EIN`, and optional `Base Score` columns.
/// A base score cell may hold a numeric pain level or a pain label.
pub fn parse_cohort<R: Read>(reader: R) -> Result<Vec<CohortMember>, CohortImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut members = Vec::new();

    for (index, record) in csv_reader.deserialize::<CohortRow>().enumerate() {
        let row = record?;
        let row_number = index + 2; // header occupies row 1

        let name = row
            .name
            .ok_or(CohortImportError::MissingName { row: row_number })?;
        let ein = row
            .ein
            .ok_or(CohortImportError::MissingEin { row: row_number })?;

        members.push(CohortMember {
            name,
            ein: Ein(ein),
            base_score: row.base_score.map(|cell| parse_base_score(&cell)),
        });
    }

    Ok(members)
}

#[derive(Debug, Deserialize)]
struct CohortRow {
    #[serde(rename = "Name", default, deserialize_with = "empty_string_as_none")]
    name: Option<String>,
    #[serde(rename = "EIN", default, deserialize_with = "empty_string_as_none")]
    ein: Option<String>,
    #[serde(
        rename = "Base Score",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    base_score: Option<String>,
}

fn parse_base_score(cell: &str) -> BaseScore {
    match cell.trim().parse::<f64>() {
        Ok(value) => BaseScore::Numeric(value),
        Err(_) => BaseScore::Label(cell.trim().to_string()),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
