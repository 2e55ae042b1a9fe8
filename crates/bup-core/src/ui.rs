//! UI state: which section is showing and which modals are open

/// Top-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Section {
    #[default]
    Home,
    Dashboard,
    Reports,
    Moderator,
    Schedule,
    Chat,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Home,
        Section::Dashboard,
        Section::Reports,
        Section::Moderator,
        Section::Schedule,
        Section::Chat,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Section::Home => "Home",
            Section::Dashboard => "Dashboard",
            Section::Reports => "Reports",
            Section::Moderator => "Moderator",
            Section::Schedule => "Schedule",
            Section::Chat => "Chat",
        }
    }

    pub fn next(&self) -> Section {
        let idx = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Section {
        let idx = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl std::str::FromStr for Section {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "home" => Ok(Section::Home),
            "dashboard" => Ok(Section::Dashboard),
            "reports" => Ok(Section::Reports),
            "moderator" => Ok(Section::Moderator),
            "schedule" => Ok(Section::Schedule),
            "chat" => Ok(Section::Chat),
            _ => Err(crate::Error::InvalidSection(s.to_string())),
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title().to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modal {
    SubmitIssue,
    IssueDetails,
    Login,
    Otp,
    Theme,
    Help,
}

/// Current section plus a stack of open modals
#[derive(Debug, Clone, Default)]
pub struct UiState {
    current_section: Section,
    modals: Vec<Modal>,
}

impl UiState {
    pub fn new(section: Section) -> Self {
        Self {
            current_section: section,
            modals: Vec::new(),
        }
    }

    pub fn current_section(&self) -> Section {
        self.current_section
    }

    /// Switch section, closing any modal; returns the previous section
    pub fn switch_section(&mut self, section: Section) -> Section {
        self.modals.clear();
        std::mem::replace(&mut self.current_section, section)
    }

    /// Open a modal on top; re-showing moves it to the top
    pub fn show(&mut self, modal: Modal) {
        self.modals.retain(|m| *m != modal);
        self.modals.push(modal);
    }

    pub fn hide(&mut self, modal: Modal) {
        self.modals.retain(|m| *m != modal);
    }

    pub fn toggle(&mut self, modal: Modal) {
        if self.is_open(modal) {
            self.hide(modal);
        } else {
            self.show(modal);
        }
    }

    pub fn is_open(&self, modal: Modal) -> bool {
        self.modals.contains(&modal)
    }

    pub fn top_modal(&self) -> Option<Modal> {
        self.modals.last().copied()
    }

    /// Close the topmost modal
    pub fn pop(&mut self) -> Option<Modal> {
        self.modals.pop()
    }

    pub fn close_all(&mut self) {
        self.modals.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modal_stack() {
        let mut ui = UiState::default();
        ui.show(Modal::SubmitIssue);
        ui.show(Modal::Login);
        assert_eq!(ui.top_modal(), Some(Modal::Login));

        ui.show(Modal::SubmitIssue);
        assert_eq!(ui.top_modal(), Some(Modal::SubmitIssue));

        ui.toggle(Modal::Login);
        assert!(!ui.is_open(Modal::Login));
        assert_eq!(ui.pop(), Some(Modal::SubmitIssue));
        assert_eq!(ui.top_modal(), None);
    }

    #[test]
    fn test_switch_section_closes_modals() {
        let mut ui = UiState::default();
        ui.show(Modal::Help);
        let previous = ui.switch_section(Section::Reports);
        assert_eq!(previous, Section::Home);
        assert_eq!(ui.current_section(), Section::Reports);
        assert!(ui.top_modal().is_none());
    }

    #[test]
    fn test_section_cycle() {
        assert_eq!(Section::Chat.next(), Section::Home);
        assert_eq!(Section::Home.previous(), Section::Chat);
        assert_eq!("moderator".parse::<Section>().unwrap(), Section::Moderator);
    }
}
