use anyhow::{Context, Result, bail};
use std::collections::HashSet;

use crate::models::{Company, FilterCriteria, JobListingEntry};

/// Bundled dataset, loaded once at startup. No runtime update mechanism.
const COMPANIES_JSON: &str = include_str!("../data/companies.json");

/// Parses the bundled company dataset and validates it. A malformed record
/// is a data-integrity defect and aborts here, not during filtering.
pub fn load_companies() -> Result<Vec<Company>> {
    let companies: Vec<Company> =
        serde_json::from_str(COMPANIES_JSON).context("Failed to parse bundled company dataset")?;
    validate_companies(&companies)?;
    Ok(companies)
}

fn validate_companies(companies: &[Company]) -> Result<()> {
    let mut company_ids: HashSet<&str> = HashSet::new();
    for company in companies {
        if company.id.trim().is_empty() {
            bail!("Company '{}' has a blank id", company.name);
        }
        if company.name.trim().is_empty() {
            bail!("Company '{}' has a blank name", company.id);
        }
        if !company_ids.insert(&company.id) {
            bail!("Duplicate company id '{}'", company.id);
        }

        let mut job_ids: HashSet<&str> = HashSet::new();
        for job in &company.jobs {
            if job.id.trim().is_empty() {
                bail!("Company '{}' has a job with a blank id", company.id);
            }
            if job.title.trim().is_empty() {
                bail!("Job '{}' in company '{}' has a blank title", job.id, company.id);
            }
            if !job_ids.insert(&job.id) {
                bail!("Duplicate job id '{}' in company '{}'", job.id, company.id);
            }
        }
    }
    Ok(())
}

/// Flattens every company's job list, company order first, job order within
/// each company second. Pure and deterministic.
pub fn flatten_listings(companies: &[Company]) -> Vec<JobListingEntry> {
    companies
        .iter()
        .flat_map(|company| {
            company.jobs.iter().map(|job| JobListingEntry {
                company_id: company.id.clone(),
                company_name: company.name.clone(),
                company_logo: company.logo.clone(),
                company_website: company.website.clone(),
                job: job.clone(),
            })
        })
        .collect()
}

/// Unique values of a field across all entries, in first-occurrence order.
/// Used to populate the selectable filter options.
pub fn distinct_values<F>(entries: &[JobListingEntry], field: F) -> Vec<String>
where
    F: Fn(&JobListingEntry) -> &str,
{
    let mut seen: HashSet<&str> = HashSet::new();
    let mut values = Vec::new();
    for entry in entries {
        let value = field(entry);
        if seen.insert(value) {
            values.push(value.to_string());
        }
    }
    values
}

pub fn job_types(entries: &[JobListingEntry]) -> Vec<String> {
    distinct_values(entries, |e| &e.job.job_type)
}

pub fn locations(entries: &[JobListingEntry]) -> Vec<String> {
    distinct_values(entries, |e| &e.job.location)
}

fn unconstrained(value: &str) -> bool {
    value.is_empty() || value == "all"
}

/// Returns the entries matching every criterion (logical AND), preserving
/// the input order. Re-applying the same criteria changes nothing.
pub fn apply_filters(entries: &[JobListingEntry], criteria: &FilterCriteria) -> Vec<JobListingEntry> {
    let term = criteria.search_term.to_lowercase();

    entries
        .iter()
        .filter(|entry| {
            if !term.is_empty() {
                let matches = entry.job.title.to_lowercase().contains(&term)
                    || entry.company_name.to_lowercase().contains(&term)
                    || entry.job.description.to_lowercase().contains(&term);
                if !matches {
                    return false;
                }
            }
            if !unconstrained(&criteria.job_type) && entry.job.job_type != criteria.job_type {
                return false;
            }
            if !unconstrained(&criteria.location) && entry.job.location != criteria.location {
                return false;
            }
            true
        })
        .cloned()
        .collect()
}

pub fn find_company<'a>(companies: &'a [Company], id: &str) -> Option<&'a Company> {
    companies.iter().find(|c| c.id == id)
}
