//! Demo data written into an empty project on first start.

use crate::err::Error;
use crate::models::{Role, Subject, User};
use crate::store::Store;

pub const DEMO_STUDENTS: i16 = 5;
pub const DEMO_STUDENT_PASSWORD: &str = "password";

fn staff(id: &str, username: &str, full_name: &str, role: Role, password: &str) -> User {
    User {
        id: id.to_string(),
        username: username.to_string(),
        full_name: full_name.to_string(),
        role,
        password: password.to_string(),
        is_active: true,
        seat_index: None,
    }
}

pub fn users() -> Vec<User> {
    let mut users = vec![
        staff("admin", "admin", "Administrator", Role::Admin, "admin"),
        staff("kurikulum", "kurikulum", "Seksi Kurikulum", Role::Kurikulum, "kurikulum"),
        staff("it", "it_logistik", "Seksi IT & Logistik", Role::ItLogistik, "it_logistik"),
    ];
    users.extend((1..=DEMO_STUDENTS).map(|seat| User {
        id: format!("student{}", seat),
        username: format!("student{}", seat),
        full_name: format!("Student {}", seat),
        role: Role::Student,
        password: DEMO_STUDENT_PASSWORD.to_string(),
        is_active: true,
        seat_index: Some(seat),
    }));
    users
}

pub fn subjects() -> Vec<Subject> {
    [
        ("s1", "Matematika", "MTK", "Bu Sari"),
        ("s2", "Fisika", "FIS", "Pak Budi"),
        ("s3", "Bahasa Indonesia", "BIN", "Bu Rina"),
    ]
    .into_iter()
    .map(|(id, name, code, teacher)| Subject {
        id: id.to_string(),
        name: name.to_string(),
        code: code.to_string(),
        teacher: teacher.to_string(),
    })
    .collect()
}

/// Seeds users and subjects when the users collection is empty. Returns
/// whether anything was written.
pub async fn seed_if_empty(store: &dyn Store) -> Result<bool, Error> {
    if !store.users().await?.is_empty() {
        return Ok(false);
    }
    for user in users() {
        store.insert_user(&user).await?;
    }
    if store.subjects().await?.is_empty() {
        for subject in subjects() {
            store.insert_subject(&subject).await?;
        }
    }
    log::info!("Seeded empty store with demo data");
    Ok(true)
}
