use crate::core::error::{PayrollError, Result};
use crate::core::{Employee, EmployeeStore, EmployeeUpdate};
use tracing::{info, instrument};

/// Creates or merges an employee record, rejecting it unless the merged result is valid.
#[instrument(name = "UpsertEmployee", skip(store, update), fields(user_id = %update.user_id))]
pub async fn upsert_employee(store: &dyn EmployeeStore, update: EmployeeUpdate) -> Result<Employee> {
    if update.user_id.trim().is_empty() {
        return Err(PayrollError::Validation("user_id must not be empty".to_string()));
    }
    let (employee, created) = store.merge_upsert(update).await?;
    info!(created, "Employee saved");
    Ok(employee)
}
