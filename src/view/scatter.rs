use crate::entity::{Position, X_RANGE, Y_RANGE, Z_RANGE};

const ACTIVE_STYLE: &str = "\x1b[36m";
const DORMANT_STYLE: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// One entity as the plot sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub position: Position,
    pub active: bool,
}

#[derive(Clone, Copy)]
enum Cell {
    Empty,
    Axis(char),
    Point { z: f64, active: bool },
}

/// Project points onto a `width` x `height` character grid, looking down the
/// z axis. When points share a cell the one with the largest z is drawn;
/// its glyph shows depth (`●` near, `•` middle, `·` far).
pub fn render_scatter(points: &[ScatterPoint], width: u16, height: u16, color: bool) -> String {
    let (width, height) = (width as usize, height as usize);
    if width == 0 || height == 0 {
        return String::new();
    }

    let mut grid = vec![Cell::Empty; width * height];
    let origin_col = column_of(0.0, width);
    let origin_row = row_of(0.0, height);
    for col in 0..width {
        grid[origin_row * width + col] = Cell::Axis('─');
    }
    for row in 0..height {
        grid[row * width + origin_col] = Cell::Axis('│');
    }
    grid[origin_row * width + origin_col] = Cell::Axis('┼');

    for point in points {
        let Position { x, y, z } = point.position;
        let idx = row_of(y, height) * width + column_of(x, width);
        let replace = match grid[idx] {
            Cell::Point { z: existing, .. } => z > existing,
            _ => true,
        };
        if replace {
            grid[idx] = Cell::Point {
                z,
                active: point.active,
            };
        }
    }

    grid.chunks(width)
        .map(|row| row.iter().map(|cell| draw(*cell, color)).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn column_of(x: f64, width: usize) -> usize {
    scale(x, *X_RANGE.start(), *X_RANGE.end(), width)
}

// Screen rows grow downwards, so y is flipped.
fn row_of(y: f64, height: usize) -> usize {
    height - 1 - scale(y, *Y_RANGE.start(), *Y_RANGE.end(), height)
}

fn scale(value: f64, min: f64, max: f64, cells: usize) -> usize {
    let t = ((value - min) / (max - min)).clamp(0.0, 1.0);
    ((t * (cells - 1) as f64).round() as usize).min(cells - 1)
}

fn glyph(z: f64) -> char {
    let span = Z_RANGE.end() - Z_RANGE.start();
    let third = span / 3.0;
    if z >= Z_RANGE.end() - third {
        '●'
    } else if z >= Z_RANGE.start() + third {
        '•'
    } else {
        '·'
    }
}

fn draw(cell: Cell, color: bool) -> String {
    match cell {
        Cell::Empty => " ".to_string(),
        Cell::Axis(ch) => ch.to_string(),
        Cell::Point { z, active } => {
            let ch = glyph(z);
            if !color {
                return ch.to_string();
            }
            let style = if active { ACTIVE_STYLE } else { DORMANT_STYLE };
            format!("{style}{ch}{RESET}")
        }
    }
}
