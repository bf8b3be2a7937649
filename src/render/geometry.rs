#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

impl Size {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Shrink by `margin` cells on every side.
    pub fn inset(&self, margin: u16) -> Rect {
        let twice = margin.saturating_mul(2);
        Rect::new(
            self.x.saturating_add(margin),
            self.y.saturating_add(margin),
            self.width.saturating_sub(twice),
            self.height.saturating_sub(twice),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Row,
    Column,
}

/// Space rule for one slice of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Fixed(u16),
    Percent(u8),
    Min(u16),
    Flex(u16),
}

/// Cut `area` along `direction`, one slice per constraint, separated by
/// `gap` cells. Fixed and percent slices shrink last when space runs out.
pub fn split(area: Rect, direction: Direction, constraints: &[Constraint], gap: u16) -> Vec<Rect> {
    if constraints.is_empty() {
        return Vec::new();
    }

    let axis = match direction {
        Direction::Row => area.width,
        Direction::Column => area.height,
    };
    let gaps = gap.saturating_mul(constraints.len().saturating_sub(1) as u16);
    let spans = distribute(axis.saturating_sub(gaps), constraints);

    let mut cursor = match direction {
        Direction::Row => area.x,
        Direction::Column => area.y,
    };
    spans
        .into_iter()
        .map(|span| {
            let rect = match direction {
                Direction::Row => Rect::new(cursor, area.y, span, area.height),
                Direction::Column => Rect::new(area.x, cursor, area.width, span),
            };
            cursor = cursor.saturating_add(span).saturating_add(gap);
            rect
        })
        .collect()
}

#[derive(Debug, Clone)]
struct Segment {
    length: u32,
    min: u32,
    flex: u32,
    locked: bool,
}

fn distribute(available: u16, constraints: &[Constraint]) -> Vec<u16> {
    let total = available as u32;
    let mut segments: Vec<Segment> = constraints
        .iter()
        .map(|constraint| segment_for(*constraint, available))
        .collect();

    let used: u32 = segments.iter().map(|s| s.length).sum();
    if used > total {
        shrink(&mut segments, used - total);
    }

    let used: u32 = segments.iter().map(|s| s.length).sum();
    let remaining = total.saturating_sub(used);
    if remaining > 0 {
        grow_flex(&mut segments, remaining);
    }

    segments
        .into_iter()
        .map(|segment| segment.length.min(u16::MAX as u32) as u16)
        .collect()
}

fn segment_for(constraint: Constraint, available: u16) -> Segment {
    match constraint {
        Constraint::Fixed(value) => Segment {
            length: value as u32,
            min: 0,
            flex: 0,
            locked: true,
        },
        Constraint::Percent(percent) => {
            let value = ((available as f32) * (percent.min(100) as f32 / 100.0)).round() as u32;
            Segment {
                length: value,
                min: 0,
                flex: 0,
                locked: true,
            }
        }
        Constraint::Min(min) => Segment {
            length: min as u32,
            min: min as u32,
            flex: 1,
            locked: false,
        },
        Constraint::Flex(weight) => Segment {
            length: 0,
            min: 0,
            flex: weight.max(1) as u32,
            locked: false,
        },
    }
}

fn shrink(segments: &mut [Segment], mut over: u32) {
    // Flexible slices give up space down to their minimum first.
    for pass_locked in [false, true] {
        while over > 0 {
            let mut changed = false;
            for segment in segments.iter_mut().filter(|s| s.locked == pass_locked) {
                if segment.length > segment.min {
                    segment.length -= 1;
                    over -= 1;
                    changed = true;
                    if over == 0 {
                        break;
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }
}

fn grow_flex(segments: &mut [Segment], remaining: u32) {
    let total_flex: u32 = segments.iter().map(|s| s.flex).sum();
    if total_flex == 0 {
        return;
    }

    let mut leftover = remaining;
    for segment in segments.iter_mut().filter(|s| s.flex > 0) {
        let share = ((remaining * segment.flex) / total_flex).min(leftover);
        segment.length += share;
        leftover -= share;
    }

    for segment in segments.iter_mut().filter(|s| s.flex > 0) {
        if leftover == 0 {
            break;
        }
        segment.length += 1;
        leftover -= 1;
    }
}
