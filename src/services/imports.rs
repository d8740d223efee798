use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entities::{customer, product};
use crate::errors::ServiceError;

/// Service for bulk CSV imports.
///
/// Files are semicolon-delimited with a header row, as exported by the
/// spreadsheets this data typically lives in. Imports are best-effort:
/// a bad row is reported and skipped, the remaining rows still land.
pub struct ImportService {
    db: Arc<DatabaseConnection>,
}

/// Outcome of a bulk import
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub inserted_count: u64,
    pub updated_count: u64,
    pub skipped_count: u64,
    pub errors: Vec<String>,
}

/// Column aliases accepted for the product cost price.
const COST_PRICE_COLUMNS: &[&str] = &[
    "Preço Custo",
    "Preco Custo",
    "Custo",
    "PreçoCusto",
    "PrecoCusto",
    "Preço de Custo",
    "Preco de Custo",
];

/// Column aliases accepted for the product selling price.
const SELL_PRICE_COLUMNS: &[&str] = &[
    "Preço Cliente",
    "Preco Cliente",
    "Preço",
    "Preco",
    "Venda",
    "PreçoCliente",
    "PrecoCliente",
    "Preço Venda",
    "Preco Venda",
    "Preço de Venda",
    "Preco de Venda",
];

impl ImportService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Imports customers from semicolon CSV text.
    ///
    /// Rows missing a usable name or phone are dropped silently; the
    /// skipped count covers rows matching an existing customer by name
    /// or phone.
    #[instrument(skip(self, csv_text), fields(user_id = %user_id))]
    pub async fn import_customers(
        &self,
        user_id: Uuid,
        csv_text: &str,
    ) -> Result<ImportReport, ServiceError> {
        let table = CsvTable::parse(csv_text)?;
        let mut report = ImportReport::default();

        let existing = customer::Entity::find()
            .filter(customer::Column::UserId.eq(user_id))
            .all(&*self.db)
            .await?;
        let mut known_names: HashSet<String> = existing
            .iter()
            .map(|c| c.name.trim().to_lowercase())
            .collect();
        let mut known_phones: HashSet<String> =
            existing.iter().map(|c| c.phone.trim().to_string()).collect();

        for (row_number, row) in table.rows() {
            let name = clean_string(table.value(row, &["Nome", "Name"]));
            let phone = clean_string(table.value(row, &["Telefone", "Phone"]));

            // Empty rows and rows without the required fields are dropped
            // without counting.
            let (Some(name), Some(phone)) = (name, phone) else {
                continue;
            };

            if known_names.contains(&name.to_lowercase()) || known_phones.contains(&phone) {
                report.skipped_count += 1;
                continue;
            }

            let result = customer::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                name: Set(name.clone()),
                phone: Set(phone.clone()),
                email: Set(clean_string(table.value(row, &["Email", "E-mail"]))),
                address: Set(clean_string(table.value(row, &["Morada", "Address"]))),
                notes: Set(clean_string(table.value(row, &["Notas", "Notes"]))),
                created_at: Set(Utc::now()),
                updated_at: Set(None),
            }
            .insert(&*self.db)
            .await;

            match result {
                Ok(_) => {
                    known_names.insert(name.to_lowercase());
                    known_phones.insert(phone);
                    report.inserted_count += 1;
                }
                Err(e) => {
                    warn!(row = row_number, "Customer import row failed: {}", e);
                    report
                        .errors
                        .push(format!("Row {}: {}", row_number, e));
                }
            }
        }

        info!(
            inserted = report.inserted_count,
            skipped = report.skipped_count,
            errors = report.errors.len(),
            "Customer import finished"
        );
        Ok(report)
    }

    /// Imports products from semicolon CSV text, keyed by product code.
    ///
    /// Rows missing a code or name are dropped silently. A row whose code
    /// matches an existing product updates that product in place (stock
    /// is left alone); otherwise a new product is created with zero
    /// stock.
    #[instrument(skip(self, csv_text), fields(user_id = %user_id))]
    pub async fn import_products(
        &self,
        user_id: Uuid,
        csv_text: &str,
    ) -> Result<ImportReport, ServiceError> {
        let table = CsvTable::parse(csv_text)?;
        let mut report = ImportReport::default();

        let mut existing: HashMap<String, product::Model> = product::Entity::find()
            .filter(product::Column::UserId.eq(user_id))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.code.clone(), p))
            .collect();

        for (row_number, row) in table.rows() {
            let code = clean_string(table.value(row, &["Código", "Codigo", "Code"]));
            let name = clean_string(table.value(row, &["Nome", "Name"]));

            let (Some(code), Some(name)) = (code, name) else {
                continue;
            };

            let category = clean_string(table.value(row, &["Categoria", "Category"]))
                .unwrap_or_else(|| "Geral".to_string());
            let range = clean_string(table.value(row, &["Gama", "Range"]))
                .unwrap_or_else(|| "Standard".to_string());
            let equivalence =
                clean_string(table.value(row, &["Equivalência", "Equivalencia"]));
            let size = clean_string(table.value(row, &["Tamanho", "Size"]));
            let brand = clean_string(table.value(row, &["Marca", "Brand"]));
            let notes = brand.map(|b| format!("Marca: {}", b));

            let cost_price = clean_decimal(table.value(row, COST_PRICE_COLUMNS));
            let sell_price = clean_decimal(table.value(row, SELL_PRICE_COLUMNS));

            let result = if let Some(current) = existing.get(&code) {
                let mut model: product::ActiveModel = current.clone().into();
                model.name = Set(name.clone());
                model.category = Set(category);
                model.range = Set(range);
                model.equivalence = Set(equivalence);
                model.size = Set(size);
                model.notes = Set(notes);
                model.cost_price = Set(cost_price);
                model.sell_price = Set(sell_price);
                model.updated_at = Set(Some(Utc::now()));
                model.update(&*self.db).await.map(|updated| {
                    report.updated_count += 1;
                    updated
                })
            } else {
                product::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    code: Set(code.clone()),
                    name: Set(name.clone()),
                    category: Set(category),
                    range: Set(range),
                    equivalence: Set(equivalence),
                    cost_price: Set(cost_price),
                    sell_price: Set(sell_price),
                    stock_quantity: Set(0),
                    allow_negative_stock: Set(false),
                    size: Set(size),
                    notes: Set(notes),
                    created_at: Set(Utc::now()),
                    updated_at: Set(None),
                }
                .insert(&*self.db)
                .await
                .map(|inserted| {
                    report.inserted_count += 1;
                    inserted
                })
            };

            match result {
                Ok(model) => {
                    existing.insert(code, model);
                }
                Err(e) => {
                    warn!(row = row_number, "Product import row failed: {}", e);
                    report
                        .errors
                        .push(format!("Row {}: {}", row_number, e));
                }
            }
        }

        info!(
            inserted = report.inserted_count,
            updated = report.updated_count,
            skipped = report.skipped_count,
            errors = report.errors.len(),
            "Product import finished"
        );
        Ok(report)
    }
}

/// A parsed semicolon-CSV file: header row plus data rows.
struct CsvTable {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

impl CsvTable {
    fn parse(input: &str) -> Result<Self, ServiceError> {
        let mut rows = parse_delimited(input, ';');
        if rows.is_empty() {
            return Err(ServiceError::InvalidInput(
                "CSV file is empty".to_string(),
            ));
        }

        let headers = rows
            .remove(0)
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();

        Ok(Self {
            headers,
            records: rows,
        })
    }

    /// Data rows paired with their 1-based file line number.
    fn rows(&self) -> impl Iterator<Item = (usize, &Vec<String>)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, row)| (i + 2, row))
    }

    /// Looks a cell up by any of the accepted header names. A blank cell
    /// falls through to the next alias, so a file carrying several price
    /// columns still yields the populated one.
    fn value<'a>(&self, row: &'a [String], aliases: &[&str]) -> Option<&'a str> {
        for alias in aliases {
            if let Some(index) = self.headers.iter().position(|h| h == alias) {
                if let Some(cell) = row.get(index) {
                    if !cell.trim().is_empty() {
                        return Some(cell.as_str());
                    }
                }
            }
        }
        None
    }
}

/// Splits delimited text into rows of fields, honoring double-quoted
/// fields with `""` escapes. Blank lines are dropped.
fn parse_delimited(input: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                '\r' => {}
                '\n' => {
                    row.push(std::mem::take(&mut field));
                    if row.iter().any(|f| !f.trim().is_empty()) {
                        rows.push(std::mem::take(&mut row));
                    } else {
                        row.clear();
                    }
                }
                c if c == delimiter => row.push(std::mem::take(&mut field)),
                _ => field.push(c),
            }
        }
    }

    row.push(field);
    if row.iter().any(|f| !f.trim().is_empty()) {
        rows.push(row);
    }

    rows
}

/// Trims a cell; empty or absent cells become `None`.
fn clean_string(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parses a price cell that may carry currency symbols, spaces, and a
/// decimal comma. Unparseable cells become zero, matching how these
/// spreadsheets treat blank prices.
fn clean_decimal(value: Option<&str>) -> Decimal {
    let Some(raw) = value else {
        return Decimal::ZERO;
    };

    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '€' | '$' | '£' | '¥') && !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    cleaned.parse::<Decimal>().unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_semicolon_rows() {
        let rows = parse_delimited("a;b;c\n1;2;3\n", ';');
        assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
    }

    #[test]
    fn parses_quoted_fields_with_embedded_delimiters() {
        let rows = parse_delimited("Nome;Notas\n\"Silva; Maria\";\"says \"\"ok\"\"\"\n", ';');
        assert_eq!(rows[1], vec!["Silva; Maria", "says \"ok\""]);
    }

    #[test]
    fn skips_blank_lines_and_handles_crlf() {
        let rows = parse_delimited("a;b\r\n\r\n1;2\r\n", ';');
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["1", "2"]);
    }

    #[test]
    fn clean_decimal_strips_currency_and_comma() {
        assert_eq!(clean_decimal(Some("€ 12,50")), dec!(12.50));
        assert_eq!(clean_decimal(Some("4.99")), dec!(4.99));
        assert_eq!(clean_decimal(Some("$ 1 250,00")), dec!(1250.00));
        assert_eq!(clean_decimal(Some("n/a")), Decimal::ZERO);
        assert_eq!(clean_decimal(None), Decimal::ZERO);
    }

    #[test]
    fn clean_string_trims_and_nullifies() {
        assert_eq!(clean_string(Some("  Maria ")), Some("Maria".to_string()));
        assert_eq!(clean_string(Some("   ")), None);
        assert_eq!(clean_string(None), None);
    }

    #[test]
    fn header_aliases_resolve_cells() {
        let table = CsvTable::parse("Código;Preço Custo\nPRF-1;€ 4,50\n").unwrap();
        let (_, row) = table.rows().next().unwrap();
        assert_eq!(table.value(row, &["Codigo", "Código"]), Some("PRF-1"));
        assert_eq!(clean_decimal(table.value(row, COST_PRICE_COLUMNS)), dec!(4.50));
    }

    #[test]
    fn alias_lookup_falls_through_blank_cells() {
        let table =
            CsvTable::parse("Código;Nome;Preço Custo;Custo;Venda\nPRF-1;Perfume;;4,50;9,00\n")
                .unwrap();
        let (_, row) = table.rows().next().unwrap();
        assert_eq!(clean_decimal(table.value(row, COST_PRICE_COLUMNS)), dec!(4.50));
        assert_eq!(clean_decimal(table.value(row, SELL_PRICE_COLUMNS)), dec!(9.00));
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(CsvTable::parse("").is_err());
    }
}
