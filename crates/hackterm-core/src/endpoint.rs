/// The two backend routes a message can be sent to.
///
/// `Chat` asks for a conversational reply, `Analyze` asks the backend to
/// debug the submitted code. Both share the same request shape and differ
/// only in the path and in which response field carries the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endpoint {
    #[default]
    Chat,
    Analyze,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Chat => "chat",
            Endpoint::Analyze => "analyze",
        }
    }

    /// URL path segment, relative to the backend base URL.
    pub fn path(&self) -> &'static str {
        self.as_str()
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "chat" => Some(Endpoint::Chat),
            "analyze" | "analyse" => Some(Endpoint::Analyze),
            _ => None,
        }
    }

    /// Label used on the action hints.
    pub fn display_name(&self) -> &'static str {
        match self {
            Endpoint::Chat => "EXECUTE",
            Endpoint::Analyze => "ANALYZE",
        }
    }
}
