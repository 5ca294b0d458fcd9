//! Relational record store implementation.
//!
//! One base `document` row per ingested document plus a typed detail row
//! in the category's table. `upsert` is keyed by DocumentID so retried or
//! repeated ingestions replace rather than duplicate.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use paperflow_core::traits::{FieldPredicate, PredicateOp};
use paperflow_core::{
    normalize, schema, Category, DocumentFields, Error, FieldKind, IdentityFields,
    InsuranceFields, InvoiceFields, RecordFilter, RecordStore, Result, StructuredRecord,
};

/// PostgreSQL implementation of [`RecordStore`].
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

/// A typed bind parameter for dynamically built queries.
enum QueryParam {
    Text(String),
    Date(NaiveDate),
    Uuid(Uuid),
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Detail table for a known category.
    fn detail_table(category: Category) -> Option<&'static str> {
        match category {
            Category::Invoice => Some("invoice"),
            Category::Insurance => Some("insurance_policy"),
            Category::IdentityDocument => Some("identity_document"),
            Category::Unknown => None,
        }
    }

    /// Typed column list for a category's SELECT, with currency columns
    /// cast back to their canonical text representation.
    fn select_columns(category: Category) -> String {
        schema::fields(category)
            .iter()
            .map(|f| match f.kind {
                FieldKind::Currency => format!("t.{0}::text AS {0}", f.name),
                _ => format!("t.{}", f.name),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Translate validated predicates into WHERE clauses and bind params.
    ///
    /// Field names are interpolated only after validation against the
    /// static schema, so they are always known `&'static str` values.
    fn predicate_clauses(
        category: Category,
        predicates: &[FieldPredicate],
        params: &mut Vec<QueryParam>,
        next_index: &mut usize,
    ) -> Result<Vec<String>> {
        let mut clauses = Vec::new();
        for pred in predicates {
            let spec = schema::field(category, &pred.field).ok_or_else(|| {
                Error::InvalidInput(format!(
                    "field '{}' is not in the {} schema",
                    pred.field, category
                ))
            })?;
            let op = match pred.op {
                PredicateOp::Eq => "=",
                PredicateOp::Gte => ">=",
                PredicateOp::Lte => "<=",
            };
            match spec.kind {
                FieldKind::Date => {
                    let date = normalize::parse_date(&pred.value).ok_or_else(|| {
                        Error::InvalidInput(format!(
                            "'{}' is not a valid date for field '{}'",
                            pred.value, pred.field
                        ))
                    })?;
                    clauses.push(format!("t.{} {} ${}", spec.name, op, next_index));
                    params.push(QueryParam::Date(date));
                }
                FieldKind::Currency => {
                    let canonical = normalize::normalize_currency(&pred.value).ok_or_else(|| {
                        Error::InvalidInput(format!(
                            "'{}' is not a valid amount for field '{}'",
                            pred.value, pred.field
                        ))
                    })?;
                    clauses.push(format!("t.{} {} ${}::numeric", spec.name, op, next_index));
                    params.push(QueryParam::Text(canonical));
                }
                FieldKind::Text | FieldKind::Identifier => {
                    clauses.push(format!("t.{} {} ${}", spec.name, op, next_index));
                    params.push(QueryParam::Text(pred.value.clone()));
                }
            }
            *next_index += 1;
        }
        Ok(clauses)
    }

    async fn upsert_detail(
        tx: &mut Transaction<'_, Postgres>,
        record: &StructuredRecord,
    ) -> Result<()> {
        match &record.fields {
            DocumentFields::Invoice(f) => {
                sqlx::query(
                    r#"
                    INSERT INTO invoice (document_id, invoice_number, vendor_name, invoice_date,
                        due_date, total_amount, subtotal, tax_amount, service_description,
                        vendor_address, vendor_phone)
                    VALUES ($1, $2, $3, $4, $5, $6::numeric, $7::numeric, $8::numeric, $9, $10, $11)
                    ON CONFLICT (document_id) DO UPDATE SET
                        invoice_number = EXCLUDED.invoice_number,
                        vendor_name = EXCLUDED.vendor_name,
                        invoice_date = EXCLUDED.invoice_date,
                        due_date = EXCLUDED.due_date,
                        total_amount = EXCLUDED.total_amount,
                        subtotal = EXCLUDED.subtotal,
                        tax_amount = EXCLUDED.tax_amount,
                        service_description = EXCLUDED.service_description,
                        vendor_address = EXCLUDED.vendor_address,
                        vendor_phone = EXCLUDED.vendor_phone
                    "#,
                )
                .bind(record.document_id)
                .bind(&f.invoice_number)
                .bind(&f.vendor_name)
                .bind(f.invoice_date)
                .bind(f.due_date)
                .bind(&f.total_amount)
                .bind(&f.subtotal)
                .bind(&f.tax_amount)
                .bind(&f.service_description)
                .bind(&f.vendor_address)
                .bind(&f.vendor_phone)
                .execute(&mut **tx)
                .await
                .map_err(Error::Database)?;
            }
            DocumentFields::Insurance(f) => {
                sqlx::query(
                    r#"
                    INSERT INTO insurance_policy (document_id, policy_number, policyholder_name,
                        insurance_company, policy_type, coverage_amount, premium_amount,
                        effective_date, expiry_date, property_address, deductible)
                    VALUES ($1, $2, $3, $4, $5, $6::numeric, $7::numeric, $8, $9, $10, $11::numeric)
                    ON CONFLICT (document_id) DO UPDATE SET
                        policy_number = EXCLUDED.policy_number,
                        policyholder_name = EXCLUDED.policyholder_name,
                        insurance_company = EXCLUDED.insurance_company,
                        policy_type = EXCLUDED.policy_type,
                        coverage_amount = EXCLUDED.coverage_amount,
                        premium_amount = EXCLUDED.premium_amount,
                        effective_date = EXCLUDED.effective_date,
                        expiry_date = EXCLUDED.expiry_date,
                        property_address = EXCLUDED.property_address,
                        deductible = EXCLUDED.deductible
                    "#,
                )
                .bind(record.document_id)
                .bind(&f.policy_number)
                .bind(&f.policyholder_name)
                .bind(&f.insurance_company)
                .bind(&f.policy_type)
                .bind(&f.coverage_amount)
                .bind(&f.premium_amount)
                .bind(f.effective_date)
                .bind(f.expiry_date)
                .bind(&f.property_address)
                .bind(&f.deductible)
                .execute(&mut **tx)
                .await
                .map_err(Error::Database)?;
            }
            DocumentFields::IdentityDocument(f) => {
                sqlx::query(
                    r#"
                    INSERT INTO identity_document (document_id, document_kind, id_number,
                        full_name, date_of_birth, issue_date, expiry_date, address, state,
                        country, gender)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                    ON CONFLICT (document_id) DO UPDATE SET
                        document_kind = EXCLUDED.document_kind,
                        id_number = EXCLUDED.id_number,
                        full_name = EXCLUDED.full_name,
                        date_of_birth = EXCLUDED.date_of_birth,
                        issue_date = EXCLUDED.issue_date,
                        expiry_date = EXCLUDED.expiry_date,
                        address = EXCLUDED.address,
                        state = EXCLUDED.state,
                        country = EXCLUDED.country,
                        gender = EXCLUDED.gender
                    "#,
                )
                .bind(record.document_id)
                .bind(&f.document_kind)
                .bind(&f.id_number)
                .bind(&f.full_name)
                .bind(f.date_of_birth)
                .bind(f.issue_date)
                .bind(f.expiry_date)
                .bind(&f.address)
                .bind(&f.state)
                .bind(&f.country)
                .bind(&f.gender)
                .execute(&mut **tx)
                .await
                .map_err(Error::Database)?;
            }
            DocumentFields::Unknown => {}
        }
        Ok(())
    }

    fn map_row(category: Category, row: &PgRow) -> StructuredRecord {
        let fields = match category {
            Category::Invoice => DocumentFields::Invoice(InvoiceFields {
                invoice_number: row.get("invoice_number"),
                vendor_name: row.get("vendor_name"),
                invoice_date: row.get("invoice_date"),
                due_date: row.get("due_date"),
                total_amount: row.get("total_amount"),
                subtotal: row.get("subtotal"),
                tax_amount: row.get("tax_amount"),
                service_description: row.get("service_description"),
                vendor_address: row.get("vendor_address"),
                vendor_phone: row.get("vendor_phone"),
            }),
            Category::Insurance => DocumentFields::Insurance(InsuranceFields {
                policy_number: row.get("policy_number"),
                policyholder_name: row.get("policyholder_name"),
                insurance_company: row.get("insurance_company"),
                policy_type: row.get("policy_type"),
                coverage_amount: row.get("coverage_amount"),
                premium_amount: row.get("premium_amount"),
                effective_date: row.get("effective_date"),
                expiry_date: row.get("expiry_date"),
                property_address: row.get("property_address"),
                deductible: row.get("deductible"),
            }),
            Category::IdentityDocument => DocumentFields::IdentityDocument(IdentityFields {
                document_kind: row.get("document_kind"),
                id_number: row.get("id_number"),
                full_name: row.get("full_name"),
                date_of_birth: row.get("date_of_birth"),
                issue_date: row.get("issue_date"),
                expiry_date: row.get("expiry_date"),
                address: row.get("address"),
                state: row.get("state"),
                country: row.get("country"),
                gender: row.get("gender"),
            }),
            Category::Unknown => DocumentFields::Unknown,
        };
        StructuredRecord {
            document_id: row.get("document_id"),
            category,
            fields,
            created_at: row.get("created_at"),
            extraction_failed: row.get("extraction_failed"),
        }
    }

    async fn query_known(
        &self,
        category: Category,
        filter: &RecordFilter,
    ) -> Result<Vec<StructuredRecord>> {
        let table = Self::detail_table(category).expect("known category");
        let mut params: Vec<QueryParam> = Vec::new();
        let mut next_index = 1usize;
        let mut clauses = Vec::new();

        if let Some(id) = filter.document_id {
            clauses.push(format!("d.document_id = ${next_index}"));
            params.push(QueryParam::Uuid(id));
            next_index += 1;
        }
        clauses.extend(Self::predicate_clauses(
            category,
            &filter.predicates,
            &mut params,
            &mut next_index,
        )?);

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let sql = format!(
            "SELECT d.document_id, d.created_at, d.extraction_failed, {columns}
             FROM document d
             JOIN {table} t ON t.document_id = d.document_id
             {where_clause}
             ORDER BY d.created_at DESC",
            columns = Self::select_columns(category),
        );

        let mut query = sqlx::query(&sql);
        for param in &params {
            query = match param {
                QueryParam::Text(v) => query.bind(v),
                QueryParam::Date(v) => query.bind(v),
                QueryParam::Uuid(v) => query.bind(v),
            };
        }

        let rows = query.fetch_all(&self.pool).await.map_err(Error::Database)?;
        Ok(rows.iter().map(|row| Self::map_row(category, row)).collect())
    }

    async fn query_unknown(&self, filter: &RecordFilter) -> Result<Vec<StructuredRecord>> {
        let mut sql = String::from(
            "SELECT document_id, created_at, extraction_failed
             FROM document WHERE category = 'unknown'",
        );
        if filter.document_id.is_some() {
            sql.push_str(" AND document_id = $1");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut query = sqlx::query(&sql);
        if let Some(id) = filter.document_id {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(Error::Database)?;
        Ok(rows
            .iter()
            .map(|row| Self::map_row(Category::Unknown, row))
            .collect())
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    #[instrument(skip(self, record), fields(subsystem = "db", component = "record_store", op = "upsert", document_id = %record.document_id, category = %record.category))]
    async fn upsert(&self, record: &StructuredRecord) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            r#"
            INSERT INTO document (document_id, category, created_at, extraction_failed)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (document_id) DO UPDATE SET
                category = EXCLUDED.category,
                created_at = EXCLUDED.created_at,
                extraction_failed = EXCLUDED.extraction_failed
            "#,
        )
        .bind(record.document_id)
        .bind(record.category.as_str())
        .bind(record.created_at)
        .bind(record.extraction_failed)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        // A re-ingestion may have reclassified the document; stale detail
        // rows in the other category tables must not survive.
        for other in Category::KNOWN {
            if other == record.category {
                continue;
            }
            let table = Self::detail_table(other).expect("known category");
            sqlx::query(&format!("DELETE FROM {table} WHERE document_id = $1"))
                .bind(record.document_id)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;
        }

        Self::upsert_detail(&mut tx, record).await?;
        tx.commit().await.map_err(Error::Database)?;
        debug!("Record upserted");
        Ok(())
    }

    async fn fetch(&self, document_id: Uuid) -> Result<Option<StructuredRecord>> {
        let row = sqlx::query("SELECT category FROM document WHERE document_id = $1")
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let category: Category = row.get::<String, _>("category").parse()?;
        let filter = RecordFilter::new().with_document_id(document_id);
        let mut records = match category {
            Category::Unknown => self.query_unknown(&filter).await?,
            known => self.query_known(known, &filter).await?,
        };
        Ok(records.pop())
    }

    async fn query(
        &self,
        category: Category,
        filter: &RecordFilter,
    ) -> Result<Vec<StructuredRecord>> {
        filter.validate(category)?;
        match category {
            Category::Unknown => self.query_unknown(filter).await,
            known => self.query_known(known, filter).await,
        }
    }

    async fn list_all(&self, category: Category) -> Result<Vec<StructuredRecord>> {
        self.query(category, &RecordFilter::new()).await
    }

    async fn delete(&self, document_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM document WHERE document_id = $1")
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
