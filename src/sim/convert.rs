//! Coordinate Converter
//!
//! Pure per-axis offset composition between coordinate frames.
//!
//! Convention (fixed by G10 L20 semantics, `offset = machine - given`):
//! `work = machine - sys_offset - global_offset`, so a coordinate
//! system's offset vector is the machine-frame location of its origin.

/// Compose a system offset with an optional extra (G92) offset
pub fn compose_offsets(sys: &[f64], extra: Option<&[f64]>) -> Vec<f64> {
    match extra {
        Some(extra) => sys
            .iter()
            .zip(extra.iter())
            .map(|(a, b)| a + b)
            .collect(),
        None => sys.to_vec(),
    }
}

/// Work frame -> machine frame
pub fn to_machine(work: &[f64], offset: &[f64]) -> Vec<f64> {
    work.iter().zip(offset.iter()).map(|(p, o)| p + o).collect()
}

/// Machine frame -> work frame
pub fn to_work(machine: &[f64], offset: &[f64]) -> Vec<f64> {
    machine
        .iter()
        .zip(offset.iter())
        .map(|(p, o)| p - o)
        .collect()
}

/// Re-express a work position from one coordinate system in another.
///
/// Either side may carry an extra offset (the global G92 layer); a
/// `None` offset pair denotes the machine frame itself.
pub fn between_systems(
    position: &[f64],
    from: Option<(&[f64], Option<&[f64]>)>,
    to: Option<(&[f64], Option<&[f64]>)>,
) -> Vec<f64> {
    let machine = match from {
        Some((sys, extra)) => to_machine(position, &compose_offsets(sys, extra)),
        None => position.to_vec(),
    };
    match to {
        Some((sys, extra)) => to_work(&machine, &compose_offsets(sys, extra)),
        None => machine,
    }
}
