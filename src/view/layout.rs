use crate::render::{Constraint, Direction, Rect, Size, split};

pub const HEADER_PANEL: &str = "alma:page.header";
pub const SIDEBAR_PANEL: &str = "alma:page.sidebar";
pub const STATUS_PANEL: &str = "alma:page.status";
pub const CONTENT_PANEL: &str = "alma:page.content";
pub const PLOT_PANEL: &str = "alma:page.plot";
pub const INPUT_PANEL: &str = "alma:page.input";

const HEADER_ROWS: u16 = 2;
const INPUT_ROWS: u16 = 2;
const STATUS_ROWS: u16 = 3;
const SIDEBAR_COLS: u16 = 30;

/// Solved rects for one terminal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    pub header: Rect,
    pub sidebar: Rect,
    pub status: Rect,
    pub content: Rect,
    pub input: Rect,
}

impl PageLayout {
    pub fn solve(size: Size) -> Self {
        let rows = split(
            Rect::from_size(size),
            Direction::Column,
            &[
                Constraint::Fixed(HEADER_ROWS),
                Constraint::Min(3),
                Constraint::Fixed(INPUT_ROWS),
            ],
            0,
        );
        let columns = split(
            rows[1],
            Direction::Row,
            &[Constraint::Fixed(SIDEBAR_COLS), Constraint::Min(20)],
            1,
        );
        let main = split(
            columns[1],
            Direction::Column,
            &[Constraint::Fixed(STATUS_ROWS), Constraint::Flex(1)],
            0,
        );

        Self {
            header: rows[0],
            sidebar: columns[0],
            status: main[0],
            content: main[1],
            input: rows[2],
        }
    }

    /// Entity list on the left, scatter plot on the right.
    pub fn universe_split(&self) -> (Rect, Rect) {
        let halves = split(
            self.content,
            Direction::Row,
            &[Constraint::Percent(45), Constraint::Flex(1)],
            1,
        );
        (halves[0], halves[1])
    }
}
