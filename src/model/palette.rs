//! Color tokens of the canonical source and the token being edited

use crate::palette::{scan, scanner, tailwind, ColorToken, SubstitutionReport, TokenKind};

#[derive(Debug, Clone, Default)]
pub struct PaletteState {
    tokens: Vec<ColorToken>,
    /// Canonical version the tokens were scanned from
    version: u64,
    /// Text of the token picked for editing
    selected: Option<String>,
    last_substitution: Option<SubstitutionReport>,
}

impl PaletteState {
    /// Rescan for a newly published canonical source
    ///
    /// A selection whose token vanished from the source is cleared.
    pub fn refresh(&mut self, version: u64, source: &str) {
        self.tokens = scan(source);
        self.version = version;
        if let Some(selected) = &self.selected {
            if scanner::find(&self.tokens, selected).is_none() {
                tracing::debug!(token = %selected, "selected token no longer in source");
                self.selected = None;
            }
        }
    }

    pub fn tokens(&self) -> &[ColorToken] {
        &self.tokens
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Pick a token for editing; unknown text leaves the selection as it was
    pub fn select(&mut self, text: &str) -> bool {
        if scanner::find(&self.tokens, text).is_none() {
            return false;
        }
        self.selected = Some(text.to_string());
        true
    }

    pub fn clear_selection(&mut self) -> Option<String> {
        self.selected.take()
    }

    pub fn selected(&self) -> Option<&ColorToken> {
        self.selected
            .as_deref()
            .and_then(|text| scanner::find(&self.tokens, text))
    }

    pub fn record_substitution(&mut self, report: SubstitutionReport) {
        self.last_substitution = Some(report);
    }

    /// Outcome of the most recent substitution request
    pub fn last_substitution(&self) -> Option<SubstitutionReport> {
        self.last_substitution
    }

    /// Replacement candidates for the selected token
    ///
    /// Utility classes get the same prefix and shade across the palette;
    /// literal colors have no fixed candidates.
    pub fn variants(&self) -> Vec<String> {
        match self.selected() {
            Some(token) if token.kind == TokenKind::UtilityClass => {
                tailwind::shade_variants(&token.text)
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_requires_known_token() {
        let mut state = PaletteState::default();
        state.refresh(1, r#"<div className="bg-blue-500" />"#);
        assert!(!state.select("bg-red-500"));
        assert!(state.select("bg-blue-500"));
        assert_eq!(state.selected().map(|t| t.text.as_str()), Some("bg-blue-500"));
        assert!(state.variants().contains(&"bg-red-500".to_string()));
    }

    #[test]
    fn test_refresh_drops_vanished_selection() {
        let mut state = PaletteState::default();
        state.refresh(1, "color: #fff;");
        assert!(state.select("#fff"));
        assert!(state.variants().is_empty());
        state.refresh(2, "color: #000;");
        assert!(state.selected().is_none());
        assert_eq!(state.version(), 2);
    }
}
