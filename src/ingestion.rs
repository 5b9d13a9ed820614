use crate::error::{RatioError, Result};
use crate::schema::{
    coerce_number, Cell, FinancialTable, LabeledRow, LabeledTable, YearRecord, YearTable,
};
use crate::utils::{LABEL_COLUMN, YEAR_COLUMN};
use log::{debug, info};
use std::collections::BTreeSet;
use std::path::Path;

/// Reads an uploaded CSV file. Only `.csv` paths are accepted.
pub fn load_csv_file(path: impl AsRef<Path>) -> Result<FinancialTable> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == "csv");
    if !is_csv {
        return Err(RatioError::InvalidFileExtension(path.display().to_string()));
    }

    info!("Loading financial table from {}", path.display());
    let text = std::fs::read_to_string(path)?;
    parse_csv(&text)
}

/// Parses CSV text into the table shape named by its first header.
///
/// `Indicador` yields a labeled table, `Ano` a table of year records.
pub fn parse_csv(text: &str) -> Result<FinancialTable> {
    if text.trim().is_empty() {
        return Err(RatioError::EmptyInput);
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let first = headers
        .get(0)
        .map(|h| h.trim_start_matches('\u{feff}').trim())
        .filter(|h| !h.is_empty())
        .ok_or(RatioError::MissingHeader)?;

    let table = match first {
        LABEL_COLUMN => FinancialTable::Labeled(read_labeled(&mut reader, &headers)?),
        YEAR_COLUMN => FinancialTable::Yearly(read_yearly(&mut reader)?),
        other => return Err(RatioError::UnknownTableShape(other.to_string())),
    };

    if table.is_empty() {
        return Err(RatioError::EmptyInput);
    }

    Ok(table)
}

fn read_labeled<R: std::io::Read>(
    reader: &mut csv::Reader<R>,
    headers: &csv::StringRecord,
) -> Result<LabeledTable> {
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;
        let mut row = LabeledRow::new(record.get(0).unwrap_or_default());

        for (header, raw) in headers.iter().zip(record.iter()).skip(1) {
            if header.is_empty() {
                continue;
            }
            let cell = match coerce_number(raw) {
                Some(n) => Cell::Number(n),
                None => Cell::Text(raw.to_string()),
            };
            row.cells.insert(header.to_string(), cell);
        }

        rows.push(row);
    }

    info!("Parsed labeled table with {} rows", rows.len());
    Ok(LabeledTable::new(rows))
}

fn read_yearly<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<YearTable> {
    let mut records = Vec::new();
    let mut seen = BTreeSet::new();

    for result in reader.deserialize::<YearRecord>() {
        let record = result?;
        if !seen.insert(record.year) {
            return Err(RatioError::DuplicateYear(record.year));
        }
        debug!("Read year record {}", record.year);
        records.push(record);
    }

    info!("Parsed fixed-schema table with {} year records", records.len());
    Ok(YearTable::new(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labeled_table() {
        let csv = "Indicador,2022,2023\n\
                   Receita Líquida,1000,1200\n\
                   Estoques, abc ,\n";

        let FinancialTable::Labeled(table) = parse_csv(csv).unwrap() else {
            panic!("expected a labeled table");
        };

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].label, "Receita Líquida");
        assert_eq!(table.rows[0].cells.get("2023"), Some(&Cell::Number(1200.0)));
        assert_eq!(table.rows[1].cells.get("2022"), Some(&Cell::Text("abc".to_string())));
        assert_eq!(table.rows[1].cells.get("2023"), Some(&Cell::Number(0.0)));
    }

    #[test]
    fn test_short_rows_leave_cells_absent() {
        let csv = "Indicador,2022,2023\nLucro Líquido,100\n";
        let FinancialTable::Labeled(table) = parse_csv(csv).unwrap() else {
            panic!("expected a labeled table");
        };
        assert!(table.rows[0].cells.get("2023").is_none());
    }

    #[test]
    fn test_parse_yearly_table() {
        let csv = "Ano,Receita_Liquida,Lucro_Liquido,ROE,Coluna_Extra\n\
                   2022,1000,80,12.5,x\n\
                   2023,1200,,n/d,y\n";

        let FinancialTable::Yearly(table) = parse_csv(csv).unwrap() else {
            panic!("expected a yearly table");
        };

        assert_eq!(table.records.len(), 2);
        let first = table.find_year_record("2022").unwrap();
        assert_eq!(first.net_revenue, 1000.0);
        assert_eq!(first.roe, 12.5);
        assert_eq!(first.total_assets, 0.0);

        let second = table.find_year_record("2023").unwrap();
        assert_eq!(second.net_income, 0.0);
        assert_eq!(second.roe, 0.0);
    }

    #[test]
    fn test_rejections() {
        assert!(matches!(parse_csv("  \n "), Err(RatioError::EmptyInput)));
        assert!(matches!(parse_csv("Indicador,2023\n"), Err(RatioError::EmptyInput)));
        assert!(matches!(
            parse_csv("Conta,2023\nReceita,1\n"),
            Err(RatioError::UnknownTableShape(h)) if h == "Conta"
        ));
        assert!(matches!(
            parse_csv("Ano,ROE\n2023,1\n2023,2\n"),
            Err(RatioError::DuplicateYear(2023))
        ));
        assert!(matches!(
            parse_csv("Ano,ROE\nvinte,1\n"),
            Err(RatioError::CsvError(_))
        ));
    }

    #[test]
    fn test_load_csv_file() {
        let dir = tempfile::tempdir().unwrap();

        let good = dir.path().join("natura.csv");
        std::fs::write(&good, "Ano,Receita_Liquida\n2023,10\n").unwrap();
        assert!(matches!(load_csv_file(&good), Ok(FinancialTable::Yearly(_))));

        let wrong = dir.path().join("natura.xlsx");
        std::fs::write(&wrong, "Ano\n2023\n").unwrap();
        assert!(matches!(
            load_csv_file(&wrong),
            Err(RatioError::InvalidFileExtension(_))
        ));

        assert!(matches!(
            load_csv_file(dir.path().join("missing.csv")),
            Err(RatioError::IoError(_))
        ));
    }
}
