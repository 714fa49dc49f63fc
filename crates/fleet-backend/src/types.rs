//! Backend wire types.

use serde::{Deserialize, Serialize};

/// A rentable customer, as drawn from the user pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub user_name: String,
}

/// The server-side record returned by a successful rental creation.
#[derive(Clone, Debug, Deserialize)]
pub struct CreatedRental {
    pub rental_id: String,
}

/// The deterministic fallback user list served when `GET /customers` fails:
/// twenty synthetic `JohnDoe{n}` users.
pub fn fallback_users() -> Vec<User> {
    (1..=20)
        .map(|uid| User {
            user_id: uid,
            user_name: format!("JohnDoe{uid}"),
        })
        .collect()
}
