use std::fmt::Write;

use crate::aggregate::Comparison;
use crate::types::{Pattern, PieceKind, Plan};

const MAX_WIDTH: f64 = 80.0;
const MAX_HEIGHT: f64 = 24.0;

/// Draws one roll: width across, length down. Cuts are boxed and labelled with
/// their order reference; remainders are boxed and filled with `.`.
pub fn render_pattern(pattern: &Pattern) -> String {
    let roll = &pattern.roll;
    if roll.width == 0 || roll.length <= 0.0 {
        return String::new();
    }
    let sx = MAX_WIDTH / roll.width as f64;
    let sy = MAX_HEIGHT / roll.length;
    let grid_w = (roll.width as f64 * sx).round() as usize;
    let grid_h = (roll.length * sy).round() as usize;

    let mut grid = vec![vec![' '; grid_w + 1]; grid_h + 1];
    draw_rect(&mut grid, 0, 0, grid_w, grid_h);

    for piece in &pattern.remaining_pieces {
        let x = (piece.x as f64 * sx).round() as usize;
        let y = (piece.y * sy).round() as usize;
        let w = (piece.width as f64 * sx).round() as usize;
        let h = (piece.length * sy).round() as usize;
        if w < 2 || h < 2 {
            continue;
        }
        fill(&mut grid, x + 1, y + 1, w - 1, h - 1, '.');
        draw_rect(&mut grid, x, y, w, h);
        let tag = match piece.kind {
            PieceKind::WidthStrip => "rem",
            PieceKind::LengthStrip => "rem (length)",
        };
        label(&mut grid, x, y, w, h, tag);
    }

    for cut in &pattern.cuts {
        let x = (cut.x as f64 * sx).round() as usize;
        let y = (cut.y * sy).round() as usize;
        let w = (cut.width as f64 * sx).round() as usize;
        let h = (cut.length * sy).round() as usize;
        if w == 0 || h == 0 {
            continue;
        }
        draw_rect(&mut grid, x, y, w, h);
        let text = match cut.collage_index {
            Some(i) => format!("{} #{}", cut.order_ref, i),
            None => cut.order_ref.clone(),
        };
        label(&mut grid, x, y, w, h, &text);
    }

    let mut result = String::new();
    for row in &grid {
        let line: String = row.iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

fn label(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize, text: &str) {
    let chars: Vec<char> = text.chars().collect();
    if w <= 2 || h == 0 {
        return;
    }
    let cx = x + w / 2;
    let cy = y + h / 2;
    let start_x = cx.saturating_sub(chars.len() / 2);
    for (i, &ch) in chars.iter().enumerate() {
        let col = start_x + i;
        if col > x && col < x + w && cy > y && cy < y + h && cy < grid.len() && col < grid[cy].len() {
            grid[cy][col] = ch;
        }
    }
}

fn fill(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize, ch: char) {
    for row in grid.iter_mut().skip(y).take(h) {
        for cell in row.iter_mut().skip(x).take(w) {
            *cell = ch;
        }
    }
}

fn draw_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    let rows = grid.len();
    let cols = if rows > 0 { grid[0].len() } else { return };

    let edge = |c: char, other: char, line: char| if c == other || c == '+' { '+' } else { line };

    for i in x..=x + w {
        if i >= cols {
            break;
        }
        for j in [y, y + h] {
            if j < rows {
                grid[j][i] = edge(grid[j][i], '|', '-');
            }
        }
    }

    for j in y..=y + h {
        if j >= rows {
            break;
        }
        for i in [x, x + w] {
            if i < cols {
                grid[j][i] = edge(grid[j][i], '-', '|');
            }
        }
    }

    for cx in [x, x + w] {
        for cy in [y, y + h] {
            if cy < rows && cx < cols {
                grid[cy][cx] = '+';
            }
        }
    }
}

/// Plain-text report: per material, per pattern, then totals and what was left over.
pub fn summary(plan: &Plan, layout: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Strategy: {}", plan.strategy);

    for m in &plan.materials {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Material {}: {} roll{}, {:.1}% efficiency",
            m.material,
            m.statistics.rolls_used,
            if m.statistics.rolls_used == 1 { "" } else { "s" },
            m.statistics.efficiency
        );
        for p in &m.patterns {
            let collage = if p.is_length_collage { " [collage]" } else { "" };
            let _ = writeln!(
                out,
                "  Roll {} ({}mm x {}m): {:.1}%, waste {:.1}, remainder {:.1}{}",
                p.roll.id, p.roll.width, p.roll.length, p.efficiency, p.waste, p.remainder_area, collage
            );
            for c in &p.cuts {
                let partial = if c.is_partial() {
                    format!(" ({:.2}m still owed)", c.remaining_length)
                } else {
                    String::new()
                };
                let _ = writeln!(
                    out,
                    "    {} {}mm x {}m @ {}mm{}",
                    c.unit_id, c.width, c.length, c.x, partial
                );
            }
            if layout {
                out.push_str(&render_pattern(p));
            }
        }
    }

    let s = &plan.statistics;
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Summary: {}/{} rolls used, {}/{} units fulfilled, {:.1}% efficiency, waste {:.1}, remainder {:.1}",
        s.rolls_used,
        s.total_rolls,
        s.fulfilled_requests,
        s.total_requests,
        s.efficiency,
        s.total_waste,
        s.total_remainder
    );
    for (priority, tier) in s.by_priority.iter().rev() {
        if tier.total > 0 {
            let _ = writeln!(out, "  {priority}: {}/{}", tier.fulfilled, tier.total);
        }
    }

    if !plan.unfulfilled.is_empty() {
        let _ = writeln!(out, "Unfulfilled:");
        for u in &plan.unfulfilled {
            let _ = writeln!(
                out,
                "  {} [{}] {}mm x {}m, {:.2}m missing ({:?})",
                u.unit_id, u.material, u.width, u.requested_length, u.residual_length, u.reason
            );
        }
    }
    out
}

pub fn comparison_table(comparison: &Comparison) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<14} {:>10} {:>14} {:>6} {:>11}",
        "strategy", "efficiency", "waste", "rolls", "fulfilled"
    );
    for r in &comparison.results {
        let _ = writeln!(
            out,
            "{:<14} {:>9.1}% {:>14.1} {:>6} {:>5}/{:<5}",
            r.strategy, r.efficiency, r.total_waste, r.rolls_used, r.fulfilled_requests, r.total_requests
        );
    }
    let best = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    let _ = writeln!(out);
    let _ = writeln!(out, "best efficiency: {}", best(&comparison.best_efficiency));
    let _ = writeln!(out, "lowest waste:    {}", best(&comparison.lowest_waste));
    let _ = writeln!(out, "fewest rolls:    {}", best(&comparison.fewest_rolls));
    let _ = writeln!(out, "most fulfilled:  {}", best(&comparison.most_fulfilled));
    out
}
