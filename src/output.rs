use std::path::Path;

use crate::error::Result;

/// A flat report table ready to be written as CSV. Headers are fixed at
/// design time by each report; nothing about the shape is derived from the
/// data at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    /// Writes the table to `path`, creating parent directories on demand.
    /// Output is deterministic: identical tables produce identical bytes.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// "66.67%" rendering for close and answer rates, two decimals.
pub fn format_percent(rate: f64) -> String {
    format!("{:.2}%", rate)
}

/// Plain two-decimal currency amount. Currency symbols and emphasis are
/// spreadsheet presentation and do not belong in CSV cells.
pub fn format_money(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Whole number column.
pub fn format_count(count: u64) -> String {
    count.to_string()
}

/// "HH:MM:SS" talk-time rendering; fractional seconds (averages) truncate.
pub fn format_hms(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatting() {
        assert_eq!(format_percent(66.666_666), "66.67%");
        assert_eq!(format_percent(0.0), "0.00%");
        assert_eq!(format_money(1234.5), "1234.50");
        assert_eq!(format_hms(0.0), "00:00:00");
        assert_eq!(format_hms(3661.0), "01:01:01");
        assert_eq!(format_hms(59.9), "00:00:59");
    }

    #[test]
    fn test_write_csv_roundtrip() {
        let mut table = Table::new(&["Salesperson", "Count"]);
        table.push_row(vec!["Rob Dively".to_string(), "3".to_string()]);
        table.push_row(vec!["Other Rep".to_string(), "0".to_string()]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");
        table.write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Salesperson,Count\nRob Dively,3\nOther Rep,0\n");
    }

    #[test]
    fn test_write_csv_is_deterministic() {
        let mut table = Table::new(&["A"]);
        table.push_row(vec!["1".to_string()]);

        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.csv");
        let second = dir.path().join("second.csv");
        table.write_csv(&first).unwrap();
        table.write_csv(&second).unwrap();

        assert_eq!(
            std::fs::read(&first).unwrap(),
            std::fs::read(&second).unwrap()
        );
    }
}
