//! The admin page: tab bar, the content of the selected tab, and the
//! recruitment toggle in its header.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::{AuthBoundary, AuthError, Session};
use crate::schema::{collection, Tab, TabKind, TABS, TEAM_TAB};
use crate::section::{AdminSection, SectionError, SectionView};
use crate::settings::{RecruitmentFlag, SettingsStore};
use crate::store::{DataStore, StoreError};
use crate::team::{TeamEditor, TeamError, TeamView};
use crate::types::Role;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShellError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Unknown tab '{0}'")]
    UnknownTab(String),

    #[error("Unknown collection '{0}'")]
    UnknownCollection(String),

    #[error("Tab '{0}' is for administrators only")]
    Forbidden(&'static str),

    #[error("No tab selected")]
    NoTabSelected,

    #[error(transparent)]
    Section(#[from] SectionError),

    #[error(transparent)]
    Team(#[from] TeamError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ShellError {
    pub fn user_message(&self) -> String {
        match self {
            ShellError::Auth(e) => e.user_message(),
            ShellError::Section(e) => e.user_message(),
            ShellError::Team(e) => e.user_message(),
            ShellError::Store(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

pub enum TabContent {
    Sections(Vec<AdminSection>),
    Team(TeamEditor),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TabView {
    Sections { sections: Vec<SectionView> },
    Team(TeamView),
}

impl TabContent {
    pub fn view(&self) -> TabView {
        match self {
            TabContent::Sections(sections) => {
                TabView::Sections { sections: sections.iter().map(AdminSection::view).collect() }
            }
            TabContent::Team(team) => TabView::Team(team.view()),
        }
    }
}

pub struct AdminShell {
    session: Session,
    role: Role,
    store: Arc<dyn DataStore>,
    settings: Arc<SettingsStore>,
    active: Option<&'static Tab>,
    content: Option<TabContent>,
}

impl AdminShell {
    /// Open the panel for whoever is signed in. Requires a resolved role.
    pub fn open(
        auth: &dyn AuthBoundary,
        store: Arc<dyn DataStore>,
        settings: Arc<SettingsStore>,
    ) -> Result<Self, ShellError> {
        let session = auth.current_session().ok_or(AuthError::NotSignedIn)?;
        let role = session.require_role()?;
        debug!("Opening admin panel for {} as {}", session.user_id, role);
        Ok(Self { session, role, store, settings, active: None, content: None })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Tabs in display order; the team tab only for administrators
    pub fn visible_tabs(&self) -> Vec<&'static Tab> {
        TABS.iter().filter(|t| !t.admin_only() || self.role.is_admin()).collect()
    }

    pub fn active_tab(&self) -> Option<&'static Tab> {
        self.active
    }

    /// Switch tabs. The previous tab's state is dropped.
    pub fn select_tab(&mut self, id: &str) -> Result<&mut TabContent, ShellError> {
        let tab = self.visible_tab(id)?;
        let content = match tab.kind {
            TabKind::Sections(_) => TabContent::Sections(
                tab.collections()
                    .into_iter()
                    .map(|spec| AdminSection::new(spec, Arc::clone(&self.store)))
                    .collect(),
            ),
            TabKind::Team => TabContent::Team(TeamEditor::new(Arc::clone(&self.store))),
        };
        info!("Selected tab {}", tab.id);
        self.active = Some(tab);
        Ok(self.content.insert(content))
    }

    fn visible_tab(&self, id: &str) -> Result<&'static Tab, ShellError> {
        let tab = TABS.iter().find(|t| t.id == id).ok_or_else(|| ShellError::UnknownTab(id.to_string()))?;
        if tab.admin_only() && !self.role.is_admin() {
            return Err(ShellError::Forbidden(tab.id));
        }
        Ok(tab)
    }

    /// Load everything on the selected tab. Sections fetch concurrently;
    /// a failed section shows its own notice and does not affect the others.
    pub async fn load_tab(&mut self) -> Result<(), ShellError> {
        match self.content.as_mut().ok_or(ShellError::NoTabSelected)? {
            TabContent::Sections(sections) => {
                let results = join_all(sections.iter_mut().map(|s| s.load())).await;
                let failed = results.iter().filter(|r| r.is_err()).count();
                if failed > 0 {
                    warn!("{} of {} sections failed to load", failed, results.len());
                }
            }
            TabContent::Team(team) => {
                if let Err(e) = team.load().await {
                    warn!("Team tab failed to load: {}", e);
                }
            }
        }
        Ok(())
    }

    pub async fn open_tab(&mut self, id: &str) -> Result<&mut TabContent, ShellError> {
        self.select_tab(id)?;
        self.load_tab().await?;
        self.content.as_mut().ok_or(ShellError::NoTabSelected)
    }

    pub fn content(&self) -> Option<&TabContent> {
        self.content.as_ref()
    }

    /// The section for `table` on the selected tab
    pub fn section_mut(&mut self, table: &str) -> Option<&mut AdminSection> {
        match self.content.as_mut()? {
            TabContent::Sections(sections) => sections.iter_mut().find(|s| s.spec().table == table),
            TabContent::Team(_) => None,
        }
    }

    /// A standalone section for one catalog collection, not yet loaded
    pub fn section_for(&self, table: &str) -> Result<AdminSection, ShellError> {
        let spec = collection(table).ok_or_else(|| ShellError::UnknownCollection(table.to_string()))?;
        Ok(AdminSection::new(spec, Arc::clone(&self.store)))
    }

    /// Team editor outside the tab flow, loaded. Administrators only.
    pub async fn open_team(&self) -> Result<TeamEditor, ShellError> {
        if !self.role.is_admin() {
            return Err(ShellError::Forbidden(TEAM_TAB));
        }
        let mut team = TeamEditor::new(Arc::clone(&self.store));
        team.load().await?;
        Ok(team)
    }

    pub fn recruitment(&self) -> RecruitmentFlag {
        self.settings.get()
    }

    /// Re-read the flag from the backend
    pub async fn refresh_recruitment(&self) -> Result<RecruitmentFlag, ShellError> {
        Ok(self.settings.refresh().await?)
    }

    pub async fn set_recruitment(&self, flag: RecruitmentFlag) -> Result<RecruitmentFlag, ShellError> {
        self.settings.set(flag).await?;
        Ok(flag)
    }

    pub async fn toggle_recruitment(&self) -> Result<RecruitmentFlag, ShellError> {
        Ok(self.settings.toggle().await?)
    }
}
