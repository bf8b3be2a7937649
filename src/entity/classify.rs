use std::fmt;

use serde::Serialize;

/// How an entity's code would be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationKind {
    /// Code ends in a plotting `show` call.
    Plot,
    /// Code drives an embedded UI framework.
    UiEmbedded,
    /// Plain source code.
    Code,
    /// Anything else.
    Text,
}

impl VisualizationKind {
    pub fn label(self) -> &'static str {
        match self {
            VisualizationKind::Plot => "plot",
            VisualizationKind::UiEmbedded => "ui-embedded",
            VisualizationKind::Code => "code",
            VisualizationKind::Text => "text",
        }
    }
}

impl fmt::Display for VisualizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const PLOT_MARKER: &str = "plt.show()";
const UI_MARKER: &str = "st.";
const CODE_MARKERS: [&str; 3] = ["def ", "class ", "import "];

/// Classify code by marker, first match wins in priority order.
pub fn classify(code: &str) -> VisualizationKind {
    if code.contains(PLOT_MARKER) {
        VisualizationKind::Plot
    } else if code.contains(UI_MARKER) {
        VisualizationKind::UiEmbedded
    } else if CODE_MARKERS.iter().any(|marker| code.contains(marker)) {
        VisualizationKind::Code
    } else {
        VisualizationKind::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_marker() {
        assert_eq!(classify("plt.plot(x)\nplt.show()"), VisualizationKind::Plot);
    }

    #[test]
    fn plot_beats_ui_marker() {
        assert_eq!(
            classify("st.title('x')\nplt.show()"),
            VisualizationKind::Plot
        );
    }

    #[test]
    fn ui_marker() {
        assert_eq!(classify("st.write('hi')"), VisualizationKind::UiEmbedded);
    }

    #[test]
    fn ui_beats_code_markers() {
        assert_eq!(
            classify("import streamlit as st\nst.title('x')"),
            VisualizationKind::UiEmbedded
        );
    }

    #[test]
    fn code_markers() {
        assert_eq!(classify("def main():\n    pass"), VisualizationKind::Code);
        assert_eq!(classify("class Foo:\n    pass"), VisualizationKind::Code);
        assert_eq!(classify("import numpy as np"), VisualizationKind::Code);
    }

    #[test]
    fn plain_text_fallback() {
        assert_eq!(classify(""), VisualizationKind::Text);
        assert_eq!(classify("x = 1"), VisualizationKind::Text);
        assert_eq!(classify("define"), VisualizationKind::Text);
    }
}
