//! In-memory directory store.
//!
//! Backs the test suites, the benchmarks and local runs without PostgreSQL.
//! Everything lives behind one `RwLock` that is never held across an await.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{MatchGroupDetail, Owner, SearchTarget, SearchedUser, StatusFilter, UserIcon, UserPredicate};
use crate::services::store::{DirectoryStore, MatchGroupRecord, StoreError};

/// One colleague with every attribute the store can filter or search on
#[derive(Debug, Clone)]
pub struct MemberRecord {
    pub user_id: String,
    pub user_name: String,
    pub kana: String,
    pub mail: String,
    pub goal: String,
    pub entry_date: NaiveDate,
    pub icon: UserIcon,
    pub office_id: String,
    pub office_name: String,
    pub department_id: Option<String>,
    pub department_name: String,
    pub role_name: String,
    pub skills: Vec<String>,
}

impl MemberRecord {
    pub fn new(user_id: &str, user_name: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            kana: user_name.to_lowercase(),
            mail: format!("{}@example.com", user_id),
            goal: String::new(),
            entry_date: NaiveDate::from_ymd_opt(2020, 4, 1).unwrap_or(NaiveDate::MIN),
            icon: UserIcon {
                file_id: format!("icon-{}", user_id),
                file_name: format!("{}.png", user_id),
            },
            office_id: "office-default".to_string(),
            office_name: "Head Office".to_string(),
            department_id: None,
            department_name: String::new(),
            role_name: String::new(),
            skills: Vec::new(),
        }
    }

    pub fn kana(mut self, kana: &str) -> Self {
        self.kana = kana.to_string();
        self
    }

    pub fn mail(mut self, mail: &str) -> Self {
        self.mail = mail.to_string();
        self
    }

    pub fn goal(mut self, goal: &str) -> Self {
        self.goal = goal.to_string();
        self
    }

    pub fn entry_date(mut self, entry_date: NaiveDate) -> Self {
        self.entry_date = entry_date;
        self
    }

    pub fn office(mut self, office_id: &str, office_name: &str) -> Self {
        self.office_id = office_id.to_string();
        self.office_name = office_name.to_string();
        self
    }

    pub fn department(mut self, department_id: &str, department_name: &str) -> Self {
        self.department_id = Some(department_id.to_string());
        self.department_name = department_name.to_string();
        self
    }

    pub fn role(mut self, role_name: &str) -> Self {
        self.role_name = role_name.to_string();
        self
    }

    pub fn skills(mut self, skills: &[&str]) -> Self {
        self.skills = skills.iter().map(|s| s.to_string()).collect();
        self
    }

    fn to_searched_user(&self) -> SearchedUser {
        SearchedUser {
            user_id: self.user_id.clone(),
            user_name: self.user_name.clone(),
            kana: self.kana.clone(),
            entry_date: self.entry_date,
            user_icon: self.icon.clone(),
            office_name: self.office_name.clone(),
        }
    }

    fn attribute_matches(&self, target: SearchTarget, needle: &str) -> bool {
        let hit = |value: &str| value.to_lowercase().contains(needle);
        match target {
            SearchTarget::UserName => hit(self.user_name.as_str()),
            SearchTarget::Kana => hit(self.kana.as_str()),
            SearchTarget::Mail => hit(self.mail.as_str()),
            SearchTarget::Department => self.department_id.is_some() && hit(self.department_name.as_str()),
            SearchTarget::Role => !self.role_name.is_empty() && hit(self.role_name.as_str()),
            SearchTarget::Office => hit(self.office_name.as_str()),
            SearchTarget::Skill => self.skills.iter().any(|skill| hit(skill.as_str())),
            SearchTarget::Goal => hit(self.goal.as_str()),
        }
    }

    fn satisfies(&self, predicate: &UserPredicate) -> bool {
        match predicate {
            UserPredicate::AllExcept(excluded) => !excluded.contains(&self.user_id),
            UserPredicate::InDepartment { department_id, excluding } => {
                self.department_id.as_ref() == Some(department_id)
                    && excluding.as_ref() != Some(&self.user_id)
            }
            UserPredicate::NotInDepartment { department_id } => self
                .department_id
                .as_ref()
                .is_some_and(|own| own != department_id),
            UserPredicate::InOffice { office_id, excluding } => {
                &self.office_id == office_id && excluding.as_ref() != Some(&self.user_id)
            }
            UserPredicate::NotInOffice { office_id } => &self.office_id != office_id,
            UserPredicate::HasAnySkill(names) => self.skills.iter().any(|skill| names.contains(skill)),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    users: Vec<MemberRecord>,
    registered_skills: HashSet<String>,
    match_groups: Vec<MatchGroupRecord>,
}

/// Directory store kept entirely in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users<I>(users: I) -> Self
    where
        I: IntoIterator<Item = MemberRecord>,
    {
        let store = Self::new();
        for user in users {
            store.add_user(user);
        }
        store
    }

    /// Add a user, registering its skills
    pub fn add_user(&self, user: MemberRecord) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.registered_skills.extend(user.skills.iter().cloned());
        state.users.push(user);
    }

    /// Register a skill nobody holds yet
    pub fn register_skill(&self, skill_name: &str) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.registered_skills.insert(skill_name.to_string());
    }

    /// Seed match history directly, bypassing selection
    pub fn add_match_group(&self, record: MatchGroupRecord) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.match_groups.push(record);
    }

    /// Make every subsequent `insert_match_group` fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn match_group_count(&self) -> usize {
        self.state.read().map(|state| state.match_groups.len()).unwrap_or_default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl DirectoryStore for InMemoryStore {
    async fn find_user_ids(&self, predicate: &UserPredicate) -> Result<Vec<String>, StoreError> {
        let state = self.read()?;
        Ok(state
            .users
            .iter()
            .filter(|user| user.satisfies(predicate))
            .map(|user| user.user_id.clone())
            .collect())
    }

    async fn find_users_by_ids(&self, user_ids: &[String]) -> Result<Vec<SearchedUser>, StoreError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let state = self.read()?;
        Ok(state
            .users
            .iter()
            .filter(|user| user_ids.contains(&user.user_id))
            .map(MemberRecord::to_searched_user)
            .collect())
    }

    async fn find_previously_matched_user_ids(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let state = self.read()?;
        let mut seen = HashSet::new();
        Ok(state
            .match_groups
            .iter()
            .filter(|group| group.member_ids.iter().any(|id| id == user_id))
            .flat_map(|group| group.member_ids.iter())
            .filter(|&id| id != user_id && seen.insert(id.as_str()))
            .cloned()
            .collect())
    }

    async fn skill_name_exists(&self, skill_name: &str) -> Result<bool, StoreError> {
        Ok(self.read()?.registered_skills.contains(skill_name))
    }

    async fn get_owner_profile(&self, user_id: &str) -> Result<Option<Owner>, StoreError> {
        let state = self.read()?;
        let Some(user) = state.users.iter().find(|user| user.user_id == user_id) else {
            return Ok(None);
        };
        let department_id = user
            .department_id
            .clone()
            .ok_or_else(|| StoreError::NotFound(format!("department of user {}", user_id)))?;

        Ok(Some(Owner {
            user_id: user.user_id.clone(),
            user_name: user.user_name.clone(),
            user_icon: user.icon.clone(),
            office_name: user.office_name.clone(),
            office_id: user.office_id.clone(),
            department_id,
        }))
    }

    async fn insert_match_group(&self, detail: &MatchGroupDetail) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Persistence {
                match_group_id: detail.match_group_id.clone(),
                message: "writes disabled".to_string(),
            });
        }

        let mut state = self.write()?;
        state.match_groups.push(MatchGroupRecord {
            match_group_id: detail.match_group_id.clone(),
            match_group_name: detail.match_group_name.clone(),
            description: detail.description.clone(),
            status: detail.status,
            created_by: detail.created_by.clone(),
            created_at: detail.created_at,
            member_ids: detail.members.iter().map(|m| m.user_id.clone()).collect(),
        });
        Ok(())
    }

    async fn search_user_ids(&self, target: SearchTarget, keyword: &str) -> Result<Vec<String>, StoreError> {
        let needle = keyword.to_lowercase();
        let state = self.read()?;
        Ok(state
            .users
            .iter()
            .filter(|user| user.attribute_matches(target, &needle))
            .map(|user| user.user_id.clone())
            .collect())
    }

    async fn get_match_group(
        &self,
        match_group_id: &str,
        status: StatusFilter,
    ) -> Result<Option<MatchGroupRecord>, StoreError> {
        let state = self.read()?;
        Ok(state
            .match_groups
            .iter()
            .find(|group| group.match_group_id == match_group_id && status.admits(group.status))
            .cloned())
    }

    async fn get_match_groups(
        &self,
        match_group_ids: &[String],
        status: StatusFilter,
    ) -> Result<Vec<MatchGroupRecord>, StoreError> {
        let state = self.read()?;
        Ok(match_group_ids
            .iter()
            .filter_map(|id| {
                state
                    .match_groups
                    .iter()
                    .find(|group| &group.match_group_id == id && status.admits(group.status))
            })
            .cloned()
            .collect())
    }

    async fn find_match_group_ids_by_user(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let state = self.read()?;
        Ok(state
            .match_groups
            .iter()
            .filter(|group| group.member_ids.iter().any(|id| id == user_id))
            .map(|group| group.match_group_id.clone())
            .collect())
    }

    async fn list_users(&self, limit: u32, offset: u32) -> Result<Vec<SearchedUser>, StoreError> {
        let state = self.read()?;
        let mut users: Vec<&MemberRecord> = state.users.iter().collect();
        users.sort_by(|a, b| a.entry_date.cmp(&b.entry_date).then_with(|| a.kana.cmp(&b.kana)));

        Ok(users
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(MemberRecord::to_searched_user)
            .collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(self.read().is_ok())
    }
}
