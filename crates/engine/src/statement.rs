//! Bank statement parsing.
//!
//! Statements arrive as UTF-8 CSV exports with a few metadata lines on top
//! (account number behind a `Cuenta:` label), a header row somewhere below,
//! and a data section whose delimiter may be `,`, `;`, or `|`. The parser is
//! a pure function over the file text; file I/O happens at the caller.
//!
//! Noise rows (running-balance lines, repeated headers, rows without a
//! posting date or amount) are filtered out, never errors. A file where no
//! header row can be located fails as [`StatementError::UnrecognizedFormat`];
//! a file that parses but yields zero qualifying rows fails as
//! [`StatementError::NoTransactions`] so the caller can tell "wrong format"
//! from "right format, no data".

use chrono::{DateTime, NaiveDate, Utc};

use crate::{MoneyCents, StatementError, TransactionKind};

/// The token that identifies the header row, in any casing, behind any
/// supported delimiter.
const DATE_HEADER_TOKEN: &str = "fecha";
/// Label in the metadata section carrying the account number.
const ACCOUNT_LABEL: &str = "cuenta:";

const AMOUNT_HEADERS: &[&str] = &["monto", "valor", "importe"];
const DESCRIPTION_HEADERS: &[&str] = &["descripcion", "descripción", "concepto", "detalle"];
const REFERENCE_HEADERS: &[&str] = &["referencia", "ref"];
const SERIAL_HEADERS: &[&str] = &["serial", "documento", "no. documento"];

/// Direction markers expected somewhere in the short description. A row
/// whose description carries none of these is a non-transaction noise row.
const DEBIT_MARKERS: &[&str] = &["DEBITO", "DÉBITO"];
/// Tax payments are debits even when the word "debito" is missing.
const TAX_PHRASE: &str = "IMPUESTO";
const CREDIT_MARKERS: &[&str] = &["CREDITO", "CRÉDITO", "ABONO"];

/// One transaction candidate extracted from a statement row.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub kind: TransactionKind,
    pub amount: MoneyCents,
    pub occurred_at: DateTime<Utc>,
    pub description: String,
    pub reference: Option<String>,
    pub serial: Option<String>,
}

/// The result of a successful parse.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedStatement {
    /// Account number from the metadata section, when present.
    pub account: Option<String>,
    pub candidates: Vec<Candidate>,
}

/// Parses a full statement export.
pub fn parse_statement(text: &str) -> Result<ParsedStatement, StatementError> {
    let lines: Vec<&str> = text.lines().collect();

    let account = extract_account(&lines);

    let header_idx = lines
        .iter()
        .position(|line| is_header_line(line))
        .ok_or_else(|| {
            StatementError::UnrecognizedFormat("no header row with a date column".to_string())
        })?;

    let delimiter = infer_delimiter(lines[header_idx]);

    let data_section = lines[header_idx..].join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(data_section.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| StatementError::UnrecognizedFormat(err.to_string()))?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let date_col = find_column(&headers, &[DATE_HEADER_TOKEN]).ok_or_else(|| {
        StatementError::UnrecognizedFormat("no header row with a date column".to_string())
    })?;
    let amount_col = find_column(&headers, AMOUNT_HEADERS).ok_or_else(|| {
        StatementError::UnrecognizedFormat("no amount column in header".to_string())
    })?;
    let description_col = find_column(&headers, DESCRIPTION_HEADERS);
    let reference_col = find_column(&headers, REFERENCE_HEADERS);
    let serial_col = find_column(&headers, SERIAL_HEADERS);

    let mut candidates = Vec::new();
    for record in reader.records() {
        let Ok(record) = record else { continue };

        let field = |idx: Option<usize>| -> Option<&str> {
            idx.and_then(|i| record.get(i)).map(str::trim)
        };

        // Rows without a posting date or amount are noise (running-balance
        // lines, repeated headers mid-file), as are rows whose description
        // carries no direction marker. They are skipped, never errors.
        let Some(occurred_at) = field(Some(date_col)).and_then(parse_date_dmy) else {
            continue;
        };
        let Some(amount) = field(Some(amount_col)).and_then(parse_bank_amount) else {
            continue;
        };
        let description = field(description_col).unwrap_or_default().to_string();
        let Some(kind) = classify(&description) else {
            continue;
        };

        let reference = field(reference_col)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);
        let serial = field(serial_col)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);

        candidates.push(Candidate {
            kind,
            amount,
            occurred_at,
            description,
            reference,
            serial,
        });
    }

    if candidates.is_empty() {
        return Err(StatementError::NoTransactions);
    }

    Ok(ParsedStatement {
        account,
        candidates,
    })
}

/// Best-effort account-number extraction from the metadata lines; absence
/// never fails the parse.
fn extract_account(lines: &[&str]) -> Option<String> {
    for line in lines.iter().take(10) {
        let lower = line.to_lowercase();
        let Some(pos) = lower.find(ACCOUNT_LABEL) else {
            continue;
        };
        let rest = &line[pos + ACCOUNT_LABEL.len()..];
        let value: &str = rest
            .split(|c| c == ',' || c == ';' || c == '|')
            .next()
            .unwrap_or("");
        let value = value.trim().trim_matches('"').trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

/// True when the line contains the date-column token as a field, whatever
/// the delimiter.
fn is_header_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower
        .split(|c| c == ',' || c == ';' || c == '|')
        .any(|field| field.trim().trim_matches('"') == DATE_HEADER_TOKEN)
}

/// Statement exports may use `;` or `|`; prefer those over `,` since amounts
/// themselves contain commas as thousands separators.
fn infer_delimiter(header_line: &str) -> u8 {
    if header_line.contains(';') {
        b';'
    } else if header_line.contains('|') {
        b'|'
    } else {
        b','
    }
}

fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h == n || h.starts_with(n)))
}

/// Classifies a row by its description markers.
///
/// A debit marker or the tax phrase means money out; a credit marker means
/// money in; no marker at all means the row is noise (`None`).
fn classify(description: &str) -> Option<TransactionKind> {
    let upper = description.to_uppercase();
    if DEBIT_MARKERS.iter().any(|m| upper.contains(m)) || upper.contains(TAX_PHRASE) {
        return Some(TransactionKind::MoneyOut);
    }
    if CREDIT_MARKERS.iter().any(|m| upper.contains(m)) {
        return Some(TransactionKind::MoneyIn);
    }
    None
}

/// Parses a statement amount: strips `,` thousands separators, tolerates a
/// sign, and returns the magnitude in cents.
fn parse_bank_amount(raw: &str) -> Option<MoneyCents> {
    let stripped = raw.trim().replace(',', "");
    if stripped.is_empty() {
        return None;
    }
    let amount: MoneyCents = stripped.parse().ok()?;
    if amount.is_negative() {
        Some(-amount)
    } else {
        Some(amount)
    }
}

/// Parses `DD/MM/YYYY` into a UTC midnight timestamp.
fn parse_date_dmy(raw: &str) -> Option<DateTime<Utc>> {
    let mut parts = raw.trim().split('/');
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Estado de Cuenta
Cuenta: 012-345678-9
Del 01/03/2026 al 31/03/2026

Fecha;Descripcion;Monto;Referencia;Documento
05/03/2026;PAGO RECIBIDO ABONO APT 302;1,250.00;REF-9912;55001
07/03/2026;DEBITO CHEQUE 1204;3,500.50;;55002
10/03/2026;SALDO DISPONIBLE;4,200.00;;
12/03/2026;PAGO DE IMPUESTO ISR;125.75;REF-9944;55003
;ABONO SIN FECHA;100.00;;
15/03/2026;ABONO TRANSFERENCIA;;REF-9950;55004
";

    #[test]
    fn parses_sample_statement() {
        let parsed = parse_statement(SAMPLE).unwrap();
        assert_eq!(parsed.account.as_deref(), Some("012-345678-9"));
        // Balance line, missing-date line, and missing-amount line are noise.
        assert_eq!(parsed.candidates.len(), 3);

        let first = &parsed.candidates[0];
        assert_eq!(first.kind, TransactionKind::MoneyIn);
        assert_eq!(first.amount.cents(), 125_000);
        assert_eq!(first.serial.as_deref(), Some("55001"));
        assert_eq!(first.reference.as_deref(), Some("REF-9912"));
    }

    #[test]
    fn debit_marker_and_tax_phrase_classify_as_money_out() {
        let parsed = parse_statement(SAMPLE).unwrap();
        assert_eq!(parsed.candidates[1].kind, TransactionKind::MoneyOut);
        assert_eq!(parsed.candidates[1].amount.cents(), 350_050);
        assert_eq!(parsed.candidates[2].kind, TransactionKind::MoneyOut);
        assert_eq!(parsed.candidates[2].amount.cents(), 12_575);
    }

    #[test]
    fn quoted_field_containing_delimiter_round_trips() {
        let text = "\
Fecha;Descripcion;Monto
02/01/2026;\"ABONO; TRANSFERENCIA APT 101\";2,000.00
";
        let parsed = parse_statement(text).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(
            parsed.candidates[0].description,
            "ABONO; TRANSFERENCIA APT 101"
        );
        assert_eq!(parsed.candidates[0].amount.cents(), 200_000);
    }

    #[test]
    fn comma_delimited_statement_parses() {
        let text = "\
Fecha,Descripcion,Monto,Referencia
09/02/2026,DEBITO COMISION,15.00,
10/02/2026,ABONO DEPOSITO,\"1,100.00\",R-1
";
        let parsed = parse_statement(text).unwrap();
        assert_eq!(parsed.candidates.len(), 2);
        assert_eq!(parsed.candidates[0].kind, TransactionKind::MoneyOut);
        assert_eq!(parsed.candidates[1].amount.cents(), 110_000);
        assert_eq!(parsed.candidates[1].reference.as_deref(), Some("R-1"));
    }

    #[test]
    fn pipe_delimited_statement_parses() {
        let text = "\
Fecha|Concepto|Importe
03/04/2026|ABONO PLANILLA|500.00
";
        let parsed = parse_statement(text).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].kind, TransactionKind::MoneyIn);
    }

    #[test]
    fn missing_header_is_unrecognized_format() {
        let err = parse_statement("just some text\nwithout a header\n").unwrap_err();
        assert!(matches!(err, StatementError::UnrecognizedFormat(_)));
    }

    #[test]
    fn header_without_rows_is_no_transactions() {
        let err = parse_statement("Fecha;Descripcion;Monto\n").unwrap_err();
        assert_eq!(err, StatementError::NoTransactions);
    }

    #[test]
    fn rows_without_direction_marker_are_noise() {
        let text = "\
Fecha;Descripcion;Monto
05/03/2026;SALDO INICIAL;9,000.00
";
        assert_eq!(
            parse_statement(text).unwrap_err(),
            StatementError::NoTransactions
        );
    }

    #[test]
    fn invalid_dates_are_filtered_not_fatal() {
        let text = "\
Fecha;Descripcion;Monto
31/02/2026;ABONO IMPOSIBLE;100.00
15/13/2026;ABONO MES MALO;100.00
15/03/2026;ABONO BUENO;100.00
";
        let parsed = parse_statement(text).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].description, "ABONO BUENO");
    }

    #[test]
    fn missing_account_metadata_is_tolerated() {
        let text = "\
Fecha;Descripcion;Monto
01/01/2026;ABONO;10.00
";
        let parsed = parse_statement(text).unwrap();
        assert_eq!(parsed.account, None);
    }

    #[test]
    fn date_parser_rejects_garbage() {
        assert!(parse_date_dmy("2026-01-01").is_none());
        assert!(parse_date_dmy("01/01").is_none());
        assert!(parse_date_dmy("aa/bb/cccc").is_none());
        assert!(parse_date_dmy("01/01/2026/05").is_none());
    }

    #[test]
    fn amount_parser_strips_thousands_separators() {
        assert_eq!(parse_bank_amount("1,234.56").unwrap().cents(), 123_456);
        assert_eq!(parse_bank_amount("-50.00").unwrap().cents(), 5_000);
        assert!(parse_bank_amount("").is_none());
        assert!(parse_bank_amount("n/a").is_none());
    }
}
