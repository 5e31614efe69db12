//! Collision record writer
//!
//! One line per event: `time id_low id_high`, in log order. Generated
//! asteroid fields are written back in the loader's 6-field form.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::sim::{Body, CollisionEvent};

#[derive(Debug, thiserror::Error)]
#[error("cannot write records: {0}")]
pub struct WriteError(#[from] std::io::Error);

/// Format one event with `decimals` digits of time
pub fn format_event(event: &CollisionEvent, decimals: usize) -> String {
    format!(
        "{:.*} {} {}",
        decimals, event.time, event.id_low, event.id_high
    )
}

/// Write events to any sink, one line each
pub fn write_collisions<W: Write>(
    mut out: W,
    events: &[CollisionEvent],
    decimals: usize,
) -> std::io::Result<()> {
    for event in events {
        writeln!(out, "{}", format_event(event, decimals))?;
    }
    out.flush()
}

/// Write events to a file, replacing it
pub fn save_collisions(
    path: &Path,
    events: &[CollisionEvent],
    decimals: usize,
) -> Result<(), WriteError> {
    let file = File::create(path)?;
    write_collisions(BufWriter::new(file), events, decimals)?;
    log::info!("Wrote {} collisions to {}", events.len(), path.display());
    Ok(())
}

/// Write bodies as `id x y vx vy radius` records
pub fn write_asteroids<W: Write>(mut out: W, bodies: &[Body]) -> std::io::Result<()> {
    for b in bodies {
        writeln!(
            out,
            "{} {} {} {} {} {}",
            b.id, b.pos.x, b.pos.y, b.vel.x, b.vel.y, b.radius
        )?;
    }
    out.flush()
}

pub fn save_asteroids(path: &Path, bodies: &[Body]) -> Result<(), WriteError> {
    let file = File::create(path)?;
    write_asteroids(BufWriter::new(file), bodies)?;
    log::info!("Wrote {} asteroids to {}", bodies.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::BodyId;

    #[test]
    fn test_format_event() {
        let e = CollisionEvent::new(0.30000000000000004, BodyId(12), BodyId(4));
        assert_eq!(format_event(&e, 1), "0.3 4 12");
        assert_eq!(format_event(&e, 3), "0.300 4 12");
        assert_eq!(format_event(&e, 0), "0 4 12");
    }

    #[test]
    fn test_write_collisions_lines() {
        let events = vec![
            CollisionEvent::new(0.0, BodyId(1), BodyId(2)),
            CollisionEvent::new(0.1, BodyId(-3), BodyId(2)),
        ];
        let mut buf = Vec::new();
        write_collisions(&mut buf, &events, 1).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "0.0 1 2\n0.1 -3 2\n");
    }

    #[test]
    fn test_write_asteroids_reloads() {
        use glam::DVec2;

        let bodies = vec![
            Body::new(4, DVec2::new(1.25, -3.0), DVec2::new(0.5, 0.0), 2.0),
            Body::new(9, DVec2::new(100.0, 200.0), DVec2::new(1.5, -0.5), 20.0),
        ];
        let mut buf = Vec::new();
        write_asteroids(&mut buf, &bodies).unwrap();
        assert_eq!(
            String::from_utf8(buf.clone()).unwrap(),
            "4 1.25 -3 0.5 0 2\n9 100 200 1.5 -0.5 20\n"
        );

        let report = crate::persistence::parse_asteroids(buf.as_slice()).unwrap();
        assert_eq!(report.bodies, bodies);
    }

    #[test]
    fn test_empty_log_writes_nothing() {
        let mut buf = Vec::new();
        write_collisions(&mut buf, &[], 1).unwrap();
        assert!(buf.is_empty());
    }
}
