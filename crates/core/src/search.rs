//! Global search across patients, professionals and medical records.

use crate::constants::SEARCH_RESULTS_PER_KIND;
use crate::notifications::patient_names;
use crate::store::{Filter, Query, RecordStore, Table};
use crate::WardResult;
use records::{decode_rows, MedicalRecord, Patient, Professional};
use serde::Serialize;
use uuid::Uuid;
use wardboard_types::SearchTerm;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    Patient,
    Professional,
    MedicalRecord,
}

impl SearchKind {
    /// Display label of the category.
    pub fn label(self) -> &'static str {
        match self {
            SearchKind::Patient => "Paciente",
            SearchKind::Professional => "Profissional",
            SearchKind::MedicalRecord => "Prontuário",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SearchResult {
    pub id: Uuid,
    pub name: String,
    pub kind: SearchKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

/// A medical record with the name of its patient, when known.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordHit {
    pub record: MedicalRecord,
    pub patient_name: Option<String>,
}

/// Concatenate the three categories in fixed order, each capped at five entries.
pub fn merge_results(
    patients: Vec<Patient>,
    professionals: Vec<Professional>,
    records: Vec<RecordHit>,
) -> Vec<SearchResult> {
    let patients = patients
        .into_iter()
        .take(SEARCH_RESULTS_PER_KIND)
        .map(|p| SearchResult {
            id: p.id,
            name: p.name,
            kind: SearchKind::Patient,
            subtitle: p.cpf,
        });
    let professionals = professionals
        .into_iter()
        .take(SEARCH_RESULTS_PER_KIND)
        .map(|p| SearchResult {
            id: p.id,
            name: p.name,
            kind: SearchKind::Professional,
            subtitle: Some(p.specialty),
        });
    let records = records
        .into_iter()
        .take(SEARCH_RESULTS_PER_KIND)
        .map(|hit| SearchResult {
            id: hit.record.id,
            name: hit.record.record_number,
            kind: SearchKind::MedicalRecord,
            subtitle: hit.patient_name,
        });

    patients.chain(professionals).chain(records).collect()
}

async fn find_patients(store: &dyn RecordStore, term: &SearchTerm) -> WardResult<Vec<Patient>> {
    let query = Query::new()
        .filter(Filter::Any(vec![
            Filter::contains("name", term.as_str()),
            Filter::contains("cpf", term.as_str()),
        ]))
        .limit(SEARCH_RESULTS_PER_KIND);
    Ok(decode_rows(store.query(Table::Patients, &query).await?))
}

async fn find_professionals(
    store: &dyn RecordStore,
    term: &SearchTerm,
) -> WardResult<Vec<Professional>> {
    let query = Query::new()
        .filter(Filter::Any(vec![
            Filter::contains("name", term.as_str()),
            Filter::contains("specialty", term.as_str()),
        ]))
        .limit(SEARCH_RESULTS_PER_KIND);
    Ok(decode_rows(store.query(Table::Professionals, &query).await?))
}

async fn find_records(store: &dyn RecordStore, term: &SearchTerm) -> WardResult<Vec<RecordHit>> {
    let query = Query::new()
        .filter(Filter::contains("record_number", term.as_str()))
        .limit(SEARCH_RESULTS_PER_KIND);
    let records: Vec<MedicalRecord> =
        decode_rows(store.query(Table::MedicalRecords, &query).await?);

    let mut ids: Vec<Uuid> = records.iter().map(|r| r.patient_id).collect();
    ids.sort_unstable();
    ids.dedup();
    let names = patient_names(store, ids).await?;

    Ok(records
        .into_iter()
        .map(|record| RecordHit {
            patient_name: names.get(&record.patient_id).cloned(),
            record,
        })
        .collect())
}

/// Search every category for `query`, case-insensitively.
///
/// A blank query returns no results without touching the store. The three lookups run
/// concurrently; the first failure is returned.
pub async fn search(store: &dyn RecordStore, query: &str) -> WardResult<Vec<SearchResult>> {
    let Some(term) = SearchTerm::parse(query) else {
        return Ok(Vec::new());
    };

    let (patients, professionals, records) = tokio::try_join!(
        find_patients(store, &term),
        find_professionals(store, &term),
        find_records(store, &term),
    )?;
    tracing::debug!(
        "search {:?}: {} patients, {} professionals, {} records",
        term.as_str(),
        patients.len(),
        professionals.len(),
        records.len()
    );

    Ok(merge_results(patients, professionals, records))
}
