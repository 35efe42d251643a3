use molsim::core::Solver;
use molsim::error::Result;
use molsim::{CollisionAdvance, MoleculeSim, Parameter, SimConfig};

fn conservative_config() -> SimConfig {
    let mut cfg = SimConfig::default();
    cfg.parameters.gravity = 0.0;
    cfg.parameters.damping = 0.0;
    cfg.parameters.elasticity = 1.0;
    cfg
}

/// A molecule whose springs all sit at their rest length, drifting with velocity
/// `drift` while spinning at `spin` rad/s about the domain centre.
///
/// Two atoms share one spring and three form an equilateral triangle, so one rest
/// length fits every spring.
fn relaxed_molecule(n: usize, cfg: &SimConfig, drift: [f64; 2], spin: f64) -> Result<MoleculeSim> {
    let mut sim = MoleculeSim::with_atoms(n, cfg)?;
    let side = sim.springs()[0].length(&sim.atoms()[0].r, &sim.atoms()[1].r);
    sim.set_parameter(Parameter::Length, side)?;
    sim.set_parameter(Parameter::LengthSpecial, side)?;
    let [cx, cy] = sim.domain().center();
    for i in 0..n {
        let [x, y] = sim.atoms()[i].r;
        sim.set_atom_velocity(i, [drift[0] - spin * (y - cy), drift[1] + spin * (x - cx)])?;
    }
    Ok(sim)
}

fn shortest_spring(sim: &MoleculeSim) -> f64 {
    sim.springs()
        .iter()
        .map(|s| s.length(&sim.atoms()[s.atom1].r, &sim.atoms()[s.atom2].r))
        .fold(f64::INFINITY, f64::min)
}

/// With no damping, no gravity and elastic walls, total energy drifts only by the
/// integrator's discretization error over many advances and wall bounces.
#[test]
fn energy_conserved_without_dissipation() -> Result<()> {
    for n in [2, 3] {
        let cfg = conservative_config();
        let mut sim = relaxed_molecule(n, &cfg, [1.5, 0.8], 0.5)?;
        let adv = CollisionAdvance::new(&cfg)?;
        let e0 = sim.energy().total();
        let mut collisions = 0;
        let mut min_len = shortest_spring(&sim);
        for _ in 0..200 {
            collisions += adv.advance(&mut sim, 0.02)?.collisions;
            min_len = min_len.min(shortest_spring(&sim));
        }
        let e1 = sim.energy().total();
        let rel = ((e1 - e0) / e0).abs();
        assert!(collisions > 0, "n={n}: molecule never reached a wall");
        // Springs stay well away from zero length, where their axis is ill-defined.
        assert!(min_len > 1.0, "n={n}: spring shrank to {min_len}");
        assert!(
            rel < 1e-3,
            "n={n}: relative energy drift {rel} too large (E0={e0}, E1={e1}, collisions={collisions})"
        );
    }
    Ok(())
}

/// Gravity is conservative too: kinetic plus m g h stays put for a falling,
/// elastically bouncing molecule.
#[test]
fn energy_conserved_with_gravity() -> Result<()> {
    let mut cfg = conservative_config();
    cfg.parameters.gravity = 3.0;
    let mut sim = relaxed_molecule(3, &cfg, [0.7, 0.0], 0.3)?;
    let adv = CollisionAdvance::new(&cfg)?;
    let e0 = sim.energy().total();
    let mut min_len = shortest_spring(&sim);
    for _ in 0..150 {
        adv.advance(&mut sim, 0.02)?;
        min_len = min_len.min(shortest_spring(&sim));
    }
    let e1 = sim.energy().total();
    assert!(min_len > 1.0, "spring shrank to {min_len}");
    assert!(((e1 - e0) / e0).abs() < 1e-3, "E0={e0}, E1={e1}");
    Ok(())
}

/// Damping only ever removes energy.
#[test]
fn damping_dissipates_energy() -> Result<()> {
    let mut cfg = conservative_config();
    cfg.parameters.damping = 0.5;
    let mut sim = relaxed_molecule(3, &cfg, [2.0, -1.0], 0.4)?;
    let adv = CollisionAdvance::new(&cfg)?;
    let start = sim.energy().total();
    let mut prev = start;
    for _ in 0..50 {
        adv.advance(&mut sim, 0.05)?;
        let e = sim.energy().total();
        assert!(e <= prev + 1e-6, "energy rose from {prev} to {e}");
        prev = e;
    }
    assert!(prev < 0.5 * start);
    Ok(())
}

/// Higher-order solvers drift less on the same run.
#[test]
fn rk4_drifts_less_than_euler() -> Result<()> {
    let drift = |solver: Solver| -> Result<f64> {
        let mut cfg = conservative_config();
        cfg.solver = solver;
        let mut sim = relaxed_molecule(3, &cfg, [0.0, 0.0], 0.8)?;
        let adv = CollisionAdvance::new(&cfg)?;
        let e0 = sim.energy().total();
        for _ in 0..40 {
            adv.advance(&mut sim, 0.025)?;
        }
        Ok((sim.energy().total() - e0).abs())
    };
    assert!(drift(Solver::RungeKutta)? < drift(Solver::Euler)?);
    Ok(())
}
