//! Customer resolution by name

use shared::OpaquePayload;
use shared::util::slug_from_name;

use crate::error::ServiceResult;
use crate::store::CustomerDirectory;

pub fn email_for(name: &str) -> String {
    format!("{}@gmail.com", slug_from_name(name))
}

/// Id of the customer called `name`, created on first sight.
///
/// A new customer's preferences are the order instructions when given.
pub async fn resolve_customer<C>(
    directory: &mut C,
    name: &str,
    instructions: Option<&OpaquePayload>,
) -> ServiceResult<i64>
where
    C: CustomerDirectory + ?Sized,
{
    let preferences = instructions
        .cloned()
        .unwrap_or_else(OpaquePayload::default_preferences);
    directory
        .find_or_create_customer(name, &email_for(name), &preferences)
        .await
}
