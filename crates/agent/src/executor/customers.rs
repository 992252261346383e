use serde_json::{json, Value};

use kirana_core::catalog::EntityRef;
use kirana_core::command::CommandResult;
use kirana_core::domain::customer::{Customer, CustomerId};

use super::{store_failure, ActionExecutor};

fn customer_row(customer: &Customer) -> Value {
    json!({
        "id": customer.id.0,
        "name": customer.name,
        "email": customer.email,
        "phone": customer.phone,
        "total_orders": customer.total_orders,
        "total_spent": customer.total_spent,
    })
}

impl ActionExecutor {
    pub(super) async fn list_customers(&self) -> CommandResult {
        match self.customers().list().await {
            Ok(customers) => CommandResult::ok_with_data(
                "list_customers",
                format!("Found {} customers", customers.len()),
                Value::Array(customers.iter().map(customer_row).collect()),
            ),
            Err(error) => store_failure("list_customers", error),
        }
    }

    pub(super) async fn get_customer(&self, target: EntityRef) -> CommandResult {
        let found = match &target {
            EntityRef::Id(id) => self.customers().get(CustomerId(*id)).await,
            EntityRef::Name(email) => self.customers().get_by_email(email).await,
        };

        match found {
            Ok(Some(customer)) => CommandResult::ok_with_data(
                "get_customer",
                format!("Found customer: {}", customer.name),
                customer_row(&customer),
            ),
            Ok(None) => CommandResult::fail("get_customer", "Customer not found"),
            Err(error) => store_failure("get_customer", error),
        }
    }

    pub(super) async fn search_customers(&self, query: String) -> CommandResult {
        match self.customers().search(&query).await {
            Ok(customers) => CommandResult::ok_with_data(
                "search_customers",
                format!("Found {} customers matching '{query}'", customers.len()),
                Value::Array(customers.iter().map(customer_row).collect()),
            ),
            Err(error) => store_failure("search_customers", error),
        }
    }
}
