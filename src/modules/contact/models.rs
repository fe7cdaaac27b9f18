use serde::{Deserialize, Serialize};

/// A message left through the contact form. Write-only: nothing reads these
/// back through the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl NewContact {
    pub fn into_submission(self, id: String) -> ContactSubmission {
        ContactSubmission {
            id,
            name: self.name,
            email: self.email,
            message: self.message,
        }
    }
}
