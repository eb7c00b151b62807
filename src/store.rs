//!
//! lectern entity store
//! --------------------
//! In-process repository for users, courses and lessons. Lookups return
//! `Option` — absence is a value, never an error — and the authorization
//! layer maps absence to a resolution failure at its own boundary.
//!
//! Entities are plain structs and are never serialized wholesale; the HTTP
//! layer shapes response JSON explicitly, so credential material cannot leak
//! into a response by accident.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::credential::{self, Credential};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Student,
    Educator,
}

impl Role {
    /// Accepts the role in any case; stored canonically uppercase.
    pub fn parse(s: &str) -> AppResult<Role> {
        match s.to_ascii_uppercase().as_str() {
            "STUDENT" => Ok(Role::Student),
            "EDUCATOR" => Ok(Role::Educator),
            other => Err(AppError::validation(format!("{} is not supported.", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub credential: Credential,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub published: bool,
    pub instructor_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct Lesson {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub content: String,
    pub resource_url: String,
}

/// Fields accepted when creating a user. The plaintext password lives only
/// for the duration of the call; the stored record carries the credential.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLesson {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub resource_url: String,
}

/// Core in-memory store. Usually wrapped in the thread-safe `SharedStore`
/// (`Arc<RwLock<Store>>`) elsewhere in the codebase.
#[derive(Default)]
pub struct Store {
    users: HashMap<String, User>,
    courses: HashMap<String, Course>,
    lessons: Vec<Lesson>,
}

/// 24-char random hex identifier (ObjectId-shaped). Fails if the system
/// CSPRNG is unavailable rather than handing out a degenerate id.
fn gen_id() -> AppResult<String> {
    let mut bytes = [0u8; 12];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| AppError::internal(format!("random source unavailable: {}", e)))?;
    use std::fmt::Write as _;
    let mut id = String::with_capacity(24);
    for b in &bytes {
        let _ = write!(&mut id, "{:02x}", b);
    }
    Ok(id)
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    /// Insert a user with an already-derived credential. Fails on a duplicate
    /// email without touching the map.
    pub fn insert_user(
        &mut self,
        name: String,
        email: String,
        role: Role,
        credential: Credential,
    ) -> AppResult<User> {
        if self.users.values().any(|u| u.email == email) {
            return Err(AppError::validation("Email already exists."));
        }
        let user = User {
            id: gen_id()?,
            name,
            email,
            role,
            credential,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.users.values().find(|u| u.email == email).cloned()
    }

    pub fn find_user_by_id(&self, id: &str) -> Option<User> {
        self.users.get(id).cloned()
    }

    pub fn list_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        users
    }

    /// Apply a partial update with any replacement credential pre-derived.
    /// An email change is held to the same uniqueness rule as `insert_user`.
    pub fn apply_user_update(
        &mut self,
        id: &str,
        upd: UserUpdate,
        credential: Option<Credential>,
        role: Option<Role>,
    ) -> AppResult<Option<User>> {
        if let Some(email) = upd.email.as_deref() {
            if self.users.values().any(|u| u.id != id && u.email == email) {
                return Err(AppError::validation("Email already exists."));
            }
        }
        let Some(user) = self.users.get_mut(id) else {
            return Ok(None);
        };
        if let Some(name) = upd.name {
            user.name = name;
        }
        if let Some(email) = upd.email {
            user.email = email;
        }
        if let Some(cred) = credential {
            user.credential = cred;
        }
        if let Some(role) = role {
            user.role = role;
        }
        user.updated_at = Some(Utc::now());
        Ok(Some(user.clone()))
    }

    /// Remove a user and everything they own.
    pub fn delete_user(&mut self, id: &str) -> bool {
        let removed = self.users.remove(id).is_some();
        if removed {
            let owned: Vec<String> = self
                .courses
                .values()
                .filter(|c| c.instructor_id == id)
                .map(|c| c.id.clone())
                .collect();
            for cid in owned {
                self.delete_course(&cid);
            }
        }
        removed
    }

    pub fn create_course(&mut self, instructor_id: &str, new: NewCourse) -> AppResult<Course> {
        let course = Course {
            id: gen_id()?,
            name: new.name,
            description: new.description,
            category: new.category,
            published: new.published,
            instructor_id: instructor_id.to_string(),
            created_at: Utc::now(),
            updated_at: None,
        };
        self.courses.insert(course.id.clone(), course.clone());
        Ok(course)
    }

    pub fn find_course_by_id(&self, id: &str) -> Option<Course> {
        self.courses.get(id).cloned()
    }

    pub fn list_courses(&self) -> Vec<Course> {
        let mut courses: Vec<Course> = self.courses.values().cloned().collect();
        courses.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        courses
    }

    pub fn courses_by_instructor(&self, instructor_id: &str) -> Vec<Course> {
        self.courses
            .values()
            .filter(|c| c.instructor_id == instructor_id)
            .cloned()
            .collect()
    }

    pub fn update_course(&mut self, id: &str, upd: CourseUpdate) -> Option<Course> {
        let course = self.courses.get_mut(id)?;
        if let Some(name) = upd.name {
            course.name = name;
        }
        if let Some(description) = upd.description {
            course.description = description;
        }
        if let Some(category) = upd.category {
            course.category = category;
        }
        if let Some(published) = upd.published {
            course.published = published;
        }
        course.updated_at = Some(Utc::now());
        Some(course.clone())
    }

    pub fn delete_course(&mut self, id: &str) -> bool {
        let removed = self.courses.remove(id).is_some();
        if removed {
            self.lessons.retain(|l| l.course_id != id);
        }
        removed
    }

    pub fn add_lesson(&mut self, course_id: &str, new: NewLesson) -> AppResult<Lesson> {
        let lesson = Lesson {
            id: gen_id()?,
            course_id: course_id.to_string(),
            title: new.title,
            content: new.content,
            resource_url: new.resource_url,
        };
        self.lessons.push(lesson.clone());
        Ok(lesson)
    }

    pub fn lessons_for_course(&self, course_id: &str) -> Vec<Lesson> {
        self.lessons
            .iter()
            .filter(|l| l.course_id == course_id)
            .cloned()
            .collect()
    }
}

/// Thread-safe shared handle over the store. Handlers and guards take read
/// or write locks for the duration of a single operation only.
#[derive(Clone, Default)]
pub struct SharedStore(pub Arc<RwLock<Store>>);

impl SharedStore {
    pub fn new() -> Self {
        SharedStore(Arc::new(RwLock::new(Store::new())))
    }

    /// Create a user account. Policy validation and key derivation happen
    /// before the write lock is taken, so concurrent sign-ups pay the
    /// derivation cost in parallel; a rejected password leaves no partial
    /// user behind.
    pub fn create_user(&self, new: NewUser) -> AppResult<User> {
        let role = Role::parse(&new.role)?;
        let credential = Credential::create(&new.password)?;
        self.0.write().insert_user(new.name, new.email, role, credential)
    }

    /// Apply a partial user update. A password change re-runs the policy and
    /// mints a whole new credential (fresh salt included) outside the lock.
    pub fn update_user(&self, id: &str, upd: UserUpdate) -> AppResult<Option<User>> {
        let credential = match upd.password.as_deref() {
            Some(pw) => Some(Credential::create(pw)?),
            None => None,
        };
        let role = match upd.role.as_deref() {
            Some(r) => Some(Role::parse(r)?),
            None => None,
        };
        self.0.write().apply_user_update(id, upd, credential, role)
    }
}

/// Convenience for verifying a submitted password against a stored user.
pub fn password_matches(user: &User, password: &str) -> bool {
    credential::verify(password, &user.credential)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ada Lovelace".into(),
            email: email.into(),
            password: "abcdefghijkl".into(),
            role: "educator".into(),
        }
    }

    #[test]
    fn rejected_password_leaves_no_partial_record() {
        let store = SharedStore::new();
        let mut nu = new_user("a@x.com");
        nu.password = "short".into();
        assert!(store.create_user(nu).is_err());
        assert!(store.0.read().find_user_by_email("a@x.com").is_none());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let store = SharedStore::new();
        store.create_user(new_user("a@x.com")).unwrap();
        let err = store.create_user(new_user("a@x.com")).unwrap_err();
        assert_eq!(err.message(), "Email already exists.");
    }

    #[test]
    fn generated_ids_are_hex_and_distinct() {
        let a = gen_id().unwrap();
        let b = gen_id().unwrap();
        assert_eq!(a.len(), 24);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
        assert_ne!(a, "000000000000000000000000");
    }

    #[test]
    fn update_cannot_take_another_users_email() {
        let store = SharedStore::new();
        store.create_user(new_user("a@x.com")).unwrap();
        let other = store.create_user(new_user("b@x.com")).unwrap();
        let upd = UserUpdate {
            email: Some("a@x.com".into()),
            ..UserUpdate::default()
        };
        let err = store.update_user(&other.id, upd).unwrap_err();
        assert_eq!(err.message(), "Email already exists.");
        let unchanged = store.0.read().find_user_by_id(&other.id).unwrap();
        assert_eq!(unchanged.email, "b@x.com");
    }

    #[test]
    fn update_may_resubmit_own_email() {
        let store = SharedStore::new();
        let user = store.create_user(new_user("a@x.com")).unwrap();
        let upd = UserUpdate {
            email: Some("a@x.com".into()),
            name: Some("Grace Hopper".into()),
            ..UserUpdate::default()
        };
        let updated = store.update_user(&user.id, upd).unwrap().unwrap();
        assert_eq!(updated.name, "Grace Hopper");
    }

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!(Role::parse("educator").unwrap(), Role::Educator);
        assert_eq!(Role::parse("STUDENT").unwrap(), Role::Student);
        assert!(Role::parse("wizard").is_err());
    }

    #[test]
    fn deleting_user_cascades_to_courses_and_lessons() {
        let shared = SharedStore::new();
        let user = shared.create_user(new_user("a@x.com")).unwrap();
        let mut store = shared.0.write();
        let course = store
            .create_course(
                &user.id,
                NewCourse {
                    name: "Rust 101".into(),
                    description: "intro".into(),
                    category: "dev".into(),
                    published: true,
                },
            )
            .unwrap();
        store
            .add_lesson(
                &course.id,
                NewLesson {
                    title: "Ownership".into(),
                    content: "moves".into(),
                    resource_url: String::new(),
                },
            )
            .unwrap();
        assert!(store.delete_user(&user.id));
        assert!(store.find_course_by_id(&course.id).is_none());
        assert!(store.lessons_for_course(&course.id).is_empty());
    }
}
