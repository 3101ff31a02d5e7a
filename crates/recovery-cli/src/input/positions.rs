use debt_recovery_core::portfolio::Portfolio;

use super::file::resolve_path;

/// Header names accepted for the recovery probability column.
const PROBABILITY_ALIASES: &[&str] = &["recovery_probability", "probability", "score_recuperacao"];

/// Header names accepted for the face value column, with the unit each implies.
const VALUE_ALIASES: &[(&str, f64)] = &[
    ("face_value", 1.0),
    ("value", 1.0),
    ("face_value_thousands", 1000.0),
    ("valor_divida_mil", 1000.0),
];

/// Column selection for a position table.
#[derive(Debug, Default, Clone)]
pub struct ColumnSelection {
    pub probability: Option<String>,
    pub value: Option<String>,
    /// Overrides the unit implied by the value column.
    pub scale: Option<f64>,
}

fn normalise(header: &str) -> String {
    header.trim().to_ascii_lowercase()
}

fn find_column(headers: &[String], wanted: &str) -> Option<usize> {
    let wanted = normalise(wanted);
    headers.iter().position(|h| *h == wanted)
}

fn resolve_probability(
    headers: &[String],
    selection: &ColumnSelection,
) -> Result<usize, Box<dyn std::error::Error>> {
    if let Some(ref name) = selection.probability {
        return find_column(headers, name)
            .ok_or_else(|| format!("Probability column '{}' not found", name).into());
    }
    PROBABILITY_ALIASES
        .iter()
        .find_map(|alias| find_column(headers, alias))
        .ok_or_else(|| {
            format!(
                "No probability column found; expected one of {:?} or --probability-column",
                PROBABILITY_ALIASES
            )
            .into()
        })
}

fn resolve_value(
    headers: &[String],
    selection: &ColumnSelection,
) -> Result<(usize, f64), Box<dyn std::error::Error>> {
    if let Some(ref name) = selection.value {
        let idx = find_column(headers, name)
            .ok_or_else(|| format!("Value column '{}' not found", name))?;
        return Ok((idx, selection.scale.unwrap_or(1.0)));
    }
    VALUE_ALIASES
        .iter()
        .find_map(|(alias, unit)| {
            find_column(headers, alias).map(|idx| (idx, selection.scale.unwrap_or(*unit)))
        })
        .ok_or_else(|| {
            let names: Vec<&str> = VALUE_ALIASES.iter().map(|(a, _)| *a).collect();
            format!(
                "No face value column found; expected one of {:?} or --value-column",
                names
            )
            .into()
        })
}

fn parse_cell(raw: &str, column: &str, row: usize) -> Result<f64, Box<dyn std::error::Error>> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| format!("Row {}: invalid {} '{}': {}", row, column, raw, e).into())
}

/// Load a scored position table from any CSV reader.
///
/// Only the probability and face value columns are read; every other
/// column is ignored.
pub fn read_positions_from<R: std::io::Read>(
    reader: R,
    selection: &ColumnSelection,
) -> Result<Portfolio, Box<dyn std::error::Error>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(normalise).collect();

    let p_idx = resolve_probability(&headers, selection)?;
    let (v_idx, scale) = resolve_value(&headers, selection)?;
    tracing::debug!(
        probability_column = %headers[p_idx],
        value_column = %headers[v_idx],
        scale,
        "resolved position columns"
    );

    let mut probabilities = Vec::new();
    let mut values = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // header is line 1
        let row = i + 2;
        let p = record.get(p_idx).unwrap_or_default();
        let v = record.get(v_idx).unwrap_or_default();
        probabilities.push(parse_cell(p, &headers[p_idx], row)?);
        values.push(parse_cell(v, &headers[v_idx], row)?);
    }

    Ok(Portfolio::from_columns(&probabilities, &values, scale)?)
}

/// Load a scored position table from a CSV file.
pub fn read_positions(
    path: &str,
    selection: &ColumnSelection,
) -> Result<Portfolio, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let file = std::fs::File::open(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    read_positions_from(file, selection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headers() {
        let csv = "id,recovery_probability,face_value\n1,0.5,100\n2,1.0,50\n";
        let p = read_positions_from(csv.as_bytes(), &ColumnSelection::default()).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p.face_value_scale(), 1.0);
        assert_eq!(p.total_face_value(), 150.0);
    }

    #[test]
    fn test_thousands_alias_implies_scale() {
        let csv = "cliente,score_recuperacao,valor_divida_mil,regiao\nA,0.9,10.5,SP\nB,0.1,2.0,RJ\n";
        let p = read_positions_from(csv.as_bytes(), &ColumnSelection::default()).unwrap();
        assert_eq!(p.face_value_scale(), 1000.0);
        assert_eq!(p.total_face_value(), 12_500.0);
    }

    #[test]
    fn test_explicit_columns_and_scale() {
        let csv = "p_hat,exposure\n0.3,7\n";
        let selection = ColumnSelection {
            probability: Some("P_HAT".into()),
            value: Some("exposure".into()),
            scale: Some(100.0),
        };
        let p = read_positions_from(csv.as_bytes(), &selection).unwrap();
        assert_eq!(p.total_face_value(), 700.0);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let csv = "a,b\n0.3,7\n";
        let err = read_positions_from(csv.as_bytes(), &ColumnSelection::default()).unwrap_err();
        assert!(err.to_string().contains("probability"));
    }

    #[test]
    fn test_bad_cell_names_row() {
        let csv = "probability,value\n0.3,7\nhigh,9\n";
        let err = read_positions_from(csv.as_bytes(), &ColumnSelection::default()).unwrap_err();
        assert!(err.to_string().contains("Row 3"));
    }

    #[test]
    fn test_out_of_range_probability_rejected() {
        let csv = "probability,value\n1.5,7\n";
        assert!(read_positions_from(csv.as_bytes(), &ColumnSelection::default()).is_err());
    }
}
