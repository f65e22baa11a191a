//! The hull-painting robot: one machine alternately told the color of the
//! panel under it and told back which color to paint plus which way to turn.

use crate::geometry::Vec2;
use intcode_vm::ports::QueuePort;
use intcode_vm::{InputPort, Machine, OutputPort, Word};
use std::collections::HashMap;
use std::thread;

/// Run the painter to completion and return the final panel grid, keyed by
/// position, value 0 (black) or 1 (white). `starting_panel` is the color of
/// the panel the robot starts on.
#[must_use]
pub fn paint(image: &[Word], starting_panel: Word) -> HashMap<Vec2, Word> {
    let camera = QueuePort::new(vec![]);
    let motor = QueuePort::new(vec![]);
    let mut brain = Machine::new(image.to_vec(), camera.clone(), motor.clone());
    let cancel = brain.cancel_token();

    tracing::debug!("painter brain booting");
    let brain_thread = {
        let cancel = cancel.clone();
        thread::spawn(move || {
            let outcome = brain.run_until_terminate();
            // Wakes up whichever side of the camera/motor exchange is still
            // blocked once the brain has nothing further to say.
            cancel.cancel();
            outcome
        })
    };

    let mut canvas = HashMap::new();
    let mut pos = Vec2::new(0, 0);
    let mut heading = Vec2::new(0, 1);
    canvas.insert(pos, starting_panel);

    loop {
        let observed = *canvas.get(&pos).unwrap_or(&0);
        if camera.write(observed, &cancel).unwrap().is_err() {
            break;
        }
        let Ok(paint_color) = motor.read(&cancel).unwrap() else {
            break;
        };
        canvas.insert(pos, paint_color);
        let Ok(turn) = motor.read(&cancel).unwrap() else {
            break;
        };
        heading = if turn == 0 {
            heading.rotate_left()
        } else {
            heading.rotate_right()
        };
        pos = pos + heading;
    }

    brain_thread.join().unwrap().unwrap();
    tracing::debug!(panels = canvas.len(), "painter brain halted");
    canvas
}

/// Count the panels painted at least once.
#[must_use]
pub fn panels_painted(canvas: &HashMap<Vec2, Word>) -> usize {
    canvas.len()
}

/// Render the non-black panels as a `#`/space grid, one row per line, read
/// top (greatest y) to bottom, matching how the registration identifier
/// puzzle part is meant to be read.
#[must_use]
pub fn render(canvas: &HashMap<Vec2, Word>) -> String {
    let lit: Vec<Vec2> = canvas
        .iter()
        .filter(|&(_, &value)| value != 0)
        .map(|(&pos, _)| pos)
        .collect();
    if lit.is_empty() {
        return String::new();
    }
    let min_x = lit.iter().map(|p| p.x).min().unwrap();
    let max_x = lit.iter().map(|p| p.x).max().unwrap();
    let min_y = lit.iter().map(|p| p.y).min().unwrap();
    let max_y = lit.iter().map(|p| p.y).max().unwrap();

    let mut out = String::new();
    for y in (min_y..=max_y).rev() {
        for x in min_x..=max_x {
            let pixel = if canvas.get(&Vec2::new(x, y)).copied().unwrap_or(0) != 0 {
                '#'
            } else {
                ' '
            };
            out.push(pixel);
        }
        out.push('\n');
    }
    out
}
