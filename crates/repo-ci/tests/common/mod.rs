//! Test doubles for repo-ci

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use repo_ci::{EnvVar, EnvVarApi, EnvVarSpec, Error, RepositorySettings, Result, SettingsApi};

/// One recorded Travis API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CiCall {
    List,
    Create(String),
    Update(String),
    Delete(String),
    Settings(RepositorySettings),
}

/// In-memory Travis repository.
#[derive(Default)]
pub struct FakeTravis {
    vars: Mutex<Vec<EnvVar>>,
    calls: Mutex<Vec<CiCall>>,
    last_id: Mutex<u32>,
    fail_delete: Option<String>,
}

pub fn var(id: &str, name: &str, value: &str) -> EnvVar {
    EnvVar {
        id: id.into(),
        name: name.into(),
        value: Some(value.into()),
        public: true,
    }
}

/// Three variables, two of which share the name `xyz`.
pub fn fixture_vars() -> Vec<EnvVar> {
    vec![
        var("id-1", "xyz", "123"),
        var("id-2", "xyz", "456"),
        var("id-3", "abc", "789"),
    ]
}

impl FakeTravis {
    pub fn with_vars(vars: Vec<EnvVar>) -> Self {
        Self {
            vars: Mutex::new(vars),
            ..Self::default()
        }
    }

    /// Make deleting the variable with `id` fail with a server error.
    pub fn failing_delete(mut self, id: &str) -> Self {
        self.fail_delete = Some(id.to_string());
        self
    }

    pub fn vars(&self) -> Vec<EnvVar> {
        self.vars.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<CiCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: CiCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn to_var(id: &str, spec: &EnvVarSpec) -> EnvVar {
        EnvVar {
            id: id.to_string(),
            name: spec.name.clone(),
            value: spec.public.then(|| spec.value.clone()),
            public: spec.public,
        }
    }
}

#[async_trait]
impl EnvVarApi for FakeTravis {
    async fn list_env_vars(&self) -> Result<Vec<EnvVar>> {
        self.record(CiCall::List);
        Ok(self.vars())
    }

    async fn create_env_var(&self, spec: &EnvVarSpec) -> Result<EnvVar> {
        self.record(CiCall::Create(spec.name.clone()));
        let id = {
            let mut last = self.last_id.lock().unwrap();
            *last += 1;
            format!("new-{}", *last)
        };
        let created = Self::to_var(&id, spec);
        self.vars.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_env_var(&self, id: &str, spec: &EnvVarSpec) -> Result<EnvVar> {
        self.record(CiCall::Update(id.to_string()));
        let updated = Self::to_var(id, spec);
        let mut vars = self.vars.lock().unwrap();
        let slot = vars
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| Error::NotFound(format!("env var {id}")))?;
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete_env_var(&self, id: &str) -> Result<()> {
        self.record(CiCall::Delete(id.to_string()));
        if self.fail_delete.as_deref() == Some(id) {
            return Err(Error::Api {
                status: 500,
                message: "boom".into(),
            });
        }
        self.vars.lock().unwrap().retain(|v| v.id != id);
        Ok(())
    }
}

#[async_trait]
impl SettingsApi for FakeTravis {
    async fn update_settings(&self, settings: &RepositorySettings) -> Result<()> {
        self.record(CiCall::Settings(settings.clone()));
        Ok(())
    }
}
