use crate::config::SimConfig;
use crate::core::collision::{CollisionKind, CollisionTolerances, WallCollision};
use crate::core::parameter::{Parameter, Parameters};
use crate::core::point_mass::{PointMass, Vec2, DIM};
use crate::core::sim_list::{ObserverId, SimList, SimListEvent, SimObject};
use crate::core::solver::OdeSystem;
use crate::core::spring::Spring;
use crate::core::wall::{Domain, Wall, WallSide};
use crate::error::{Error, Result};
use log::{debug, trace};
use rand::{rng, rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::PI;
use std::ops::RangeInclusive;

/// Supported molecule sizes.
pub const ATOM_COUNTS: RangeInclusive<usize> = 2..=6;

/// Index of the atom whose mass is `MassSpecial`; springs touching it are special.
pub const SPECIAL_ATOM: usize = 1;

/// State-vector slots per atom: x, y, vx, vy.
pub const STATE_STRIDE: usize = 2 * DIM;

/// Gaps above `-GAP_EPS` are rounding noise from snapping onto a wall face.
const GAP_EPS: f64 = 1e-12;

/// Spring endpoints for each molecule size, starting at two atoms.
///
/// Each entry is the polygon ring plus enough diagonals from atom 0 to keep the
/// shape rigid in 2D (2n - 3 springs).
const TOPOLOGY: [&[(usize, usize)]; 5] = [
    &[(0, 1)],
    &[(0, 1), (1, 2), (2, 0)],
    &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)],
    &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0), (0, 2), (0, 3)],
    &[
        (0, 1),
        (1, 2),
        (2, 3),
        (3, 4),
        (4, 5),
        (5, 0),
        (0, 2),
        (0, 3),
        (0, 4),
    ],
];

/// Energy breakdown of the molecule.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyInfo {
    pub kinetic: f64,
    pub spring_potential: f64,
    /// `m g h` with `h` measured from the bottom of the domain.
    pub gravity_potential: f64,
}

impl EnergyInfo {
    pub fn total(&self) -> f64 {
        self.kinetic + self.spring_potential + self.gravity_potential
    }
}

/// Molecule of 2–6 atoms joined by springs inside four walls.
///
/// Owns the atoms, walls and springs, evaluates the force law for the solver and
/// publishes every live entity through its [`SimList`].
#[derive(Debug)]
pub struct MoleculeSim {
    params: Parameters,
    domain: Domain,
    atom_radius: f64,
    wall_thickness: f64,
    seed: Option<u64>,
    initial_speed: f64,
    time_now: f64,
    atoms: Vec<PointMass>,
    walls: Vec<Wall>,
    springs: Vec<Spring>,
    sim_list: SimList,
}

impl MoleculeSim {
    /// Create an empty simulation. Attach observers, then call [`MoleculeSim::configure`].
    pub fn new(config: &SimConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            params: config.parameters,
            domain: config.domain,
            atom_radius: config.atom_radius,
            wall_thickness: config.wall_thickness,
            seed: config.seed,
            initial_speed: config.initial_speed,
            time_now: 0.0,
            atoms: Vec::new(),
            walls: Vec::new(),
            springs: Vec::new(),
            sim_list: SimList::new(),
        })
    }

    /// Shorthand for `new` followed by `configure(num_atoms)`.
    pub fn with_atoms(num_atoms: usize, config: &SimConfig) -> Result<Self> {
        let mut sim = Self::new(config)?;
        sim.configure(num_atoms)?;
        Ok(sim)
    }

    /// Rebuild the molecule with `num_atoms` atoms.
    ///
    /// Atoms sit on a regular polygon around the domain centre. The registry is
    /// emptied (springs leave before their atoms) and refilled with walls, then atoms,
    /// then springs. Time restarts at zero.
    ///
    /// Errors: `Error::InvalidConfig` if `num_atoms` is outside 2..=6; nothing changes.
    pub fn configure(&mut self, num_atoms: usize) -> Result<()> {
        if !ATOM_COUNTS.contains(&num_atoms) {
            return Err(Error::InvalidConfig(format!(
                "atom count must be in {}..={}, got {}",
                ATOM_COUNTS.start(),
                ATOM_COUNTS.end(),
                num_atoms
            )));
        }

        let walls = WallSide::ALL
            .iter()
            .map(|&side| Wall::new(side, &self.domain, self.wall_thickness))
            .collect::<Result<Vec<_>>>()?;

        let mut rng: StdRng = match self.seed {
            Some(s) => SeedableRng::seed_from_u64(s),
            None => SeedableRng::seed_from_u64(rng().random()),
        };
        let [cx, cy] = self.domain.center();
        let ring = 0.25 * self.domain.width().min(self.domain.height());
        let mut atoms = Vec::with_capacity(num_atoms);
        for i in 0..num_atoms {
            let angle = 0.5 * PI + 2.0 * PI * (i as f64) / (num_atoms as f64);
            let r = [cx + ring * angle.cos(), cy + ring * angle.sin()];
            let mass = if i == SPECIAL_ATOM {
                self.params.mass_special
            } else {
                self.params.mass
            };
            let mut atom = PointMass::circle(format!("ATOM{}", i + 1), r, self.atom_radius, mass)?;
            if self.initial_speed > 0.0 {
                let s = self.initial_speed;
                atom.set_velocity([rng.random_range(-s..=s), rng.random_range(-s..=s)])?;
            }
            atoms.push(atom);
        }

        let springs = TOPOLOGY[num_atoms - ATOM_COUNTS.start()]
            .iter()
            .map(|&(a, b)| {
                let special = a == SPECIAL_ATOM || b == SPECIAL_ATOM;
                if special {
                    Spring::new(a, b, self.params.length_special, self.params.stiffness_special, true)
                } else {
                    Spring::new(a, b, self.params.length, self.params.stiffness, false)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        self.sim_list.clear();
        self.walls = walls;
        self.atoms = atoms;
        self.springs = springs;
        self.time_now = 0.0;

        for wall in &self.walls {
            self.sim_list.add(SimObject::Wall { side: wall.side })?;
        }
        for (index, atom) in self.atoms.iter().enumerate() {
            self.sim_list.add(SimObject::Atom {
                index,
                name: atom.name.clone(),
            })?;
        }
        for (index, spring) in self.springs.iter().enumerate() {
            self.sim_list.add(SimObject::Spring {
                index,
                name: spring.name.clone(),
                special: spring.special,
            })?;
        }
        debug!(
            "configured molecule: {} atoms, {} springs, {} walls",
            self.atoms.len(),
            self.springs.len(),
            self.walls.len()
        );
        Ok(())
    }

    // ============ Introspection ============

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.time_now
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn atoms(&self) -> &[PointMass] {
        &self.atoms
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn sim_list(&self) -> &SimList {
        &self.sim_list
    }

    /// Subscribe to entity add/remove events.
    pub fn add_observer<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&SimListEvent) + 'static,
    {
        self.sim_list.add_observer(observer)
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.sim_list.remove_observer(id)
    }

    /// The point mass behind an atom or wall handle, if it is live.
    pub fn body(&self, obj: &SimObject) -> Option<&PointMass> {
        match obj {
            SimObject::Atom { index, name } => self.atoms.get(*index).filter(|a| &a.name == name),
            SimObject::Wall { side } => self.walls.iter().find(|w| w.side == *side).map(|w| &w.body),
            SimObject::Spring { .. } => None,
        }
    }

    /// The spring behind a spring handle, if it is live.
    pub fn spring(&self, obj: &SimObject) -> Option<&Spring> {
        match obj {
            SimObject::Spring { index, name, .. } => self.springs.get(*index).filter(|s| &s.name == name),
            _ => None,
        }
    }

    // ============ Parameters ============

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn parameter(&self, p: Parameter) -> f64 {
        self.params.get(p)
    }

    /// Set a parameter; atoms and springs pick up the new value immediately and the
    /// next force evaluation uses it.
    ///
    /// Errors: `Error::InvalidParam` for non-physical values; the old value stays.
    pub fn set_parameter(&mut self, p: Parameter, value: f64) -> Result<()> {
        p.check(value)?;
        match p {
            Parameter::Mass | Parameter::MassSpecial => {
                let special = p == Parameter::MassSpecial;
                for (i, atom) in self.atoms.iter_mut().enumerate() {
                    if (i == SPECIAL_ATOM) == special {
                        atom.set_mass(value)?;
                    }
                }
            }
            Parameter::Length | Parameter::LengthSpecial => {
                let special = p == Parameter::LengthSpecial;
                for s in self.springs.iter_mut().filter(|s| s.special == special) {
                    s.set_rest_length(value)?;
                }
            }
            Parameter::Stiffness | Parameter::StiffnessSpecial => {
                let special = p == Parameter::StiffnessSpecial;
                for s in self.springs.iter_mut().filter(|s| s.special == special) {
                    s.set_stiffness(value)?;
                }
            }
            Parameter::Gravity | Parameter::Damping | Parameter::Elasticity => {}
        }
        self.params.set(p, value)
    }

    // ============ State ============

    /// Flat state vector `(x, y, vx, vy)` per atom, in atom order.
    pub fn state(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(STATE_STRIDE * self.atoms.len());
        for a in &self.atoms {
            out.extend_from_slice(&[a.r[0], a.r[1], a.v[0], a.v[1]]);
        }
        out
    }

    /// Overwrite atom positions/velocities and the clock.
    pub fn set_state(&mut self, state: &[f64], time: f64) -> Result<()> {
        self.check_state_len(state)?;
        if !time.is_finite() || !state.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("state and time must be finite".into()));
        }
        for (atom, chunk) in self.atoms.iter_mut().zip(state.chunks_exact(STATE_STRIDE)) {
            atom.r = [chunk[0], chunk[1]];
            atom.v = [chunk[2], chunk[3]];
        }
        self.time_now = time;
        Ok(())
    }

    pub fn set_atom_position(&mut self, index: usize, r: Vec2) -> Result<()> {
        self.atom_mut(index)?.set_position(r)
    }

    pub fn set_atom_velocity(&mut self, index: usize, v: Vec2) -> Result<()> {
        self.atom_mut(index)?.set_velocity(v)
    }

    fn check_state_len(&self, state: &[f64]) -> Result<()> {
        if state.len() != self.state_len() {
            return Err(Error::InvalidParam(format!(
                "state length must be {}, got {}",
                self.state_len(),
                state.len()
            )));
        }
        Ok(())
    }

    fn atom_mut(&mut self, index: usize) -> Result<&mut PointMass> {
        let n = self.atoms.len();
        self.atoms
            .get_mut(index)
            .ok_or_else(|| Error::InvalidParam(format!("atom index {index} out of range (have {n})")))
    }

    /// Kinetic, spring and gravitational energy of the current state.
    pub fn energy(&self) -> EnergyInfo {
        let kinetic = self.atoms.iter().map(|a| a.kinetic_energy()).sum();
        let spring_potential = self
            .springs
            .iter()
            .map(|s| s.potential_energy(&self.atoms[s.atom1].r, &self.atoms[s.atom2].r))
            .sum();
        let gravity_potential = self
            .atoms
            .iter()
            .map(|a| a.mass * self.params.gravity * (a.r[1] - self.domain.y_min))
            .sum();
        EnergyInfo {
            kinetic,
            spring_potential,
            gravity_potential,
        }
    }

    // ============ Collisions ============

    /// Atom–wall contacts produced by moving from `before` to `after` over `h`.
    ///
    /// Walls are half-spaces, so an atom that tunnels through cannot be missed. An
    /// atom that goes in and comes back out within the step is caught by the sign
    /// change of its normal velocity and an estimate of the turning-point gap.
    pub fn find_collisions(
        &self,
        before: &[f64],
        after: &[f64],
        h: f64,
        tol: &CollisionTolerances,
    ) -> Result<Vec<WallCollision>> {
        self.check_state_len(before)?;
        self.check_state_len(after)?;
        let mut out = Vec::new();
        for (i, atom) in self.atoms.iter().enumerate() {
            let o = STATE_STRIDE * i;
            let (r0, v0) = ([before[o], before[o + 1]], [before[o + 2], before[o + 3]]);
            let (r1, v1) = ([after[o], after[o + 1]], [after[o + 2], after[o + 3]]);
            for wall in &self.walls {
                let half = atom.shape.half_extent(wall.side.axis());
                let (g0, g1) = (wall.gap(&r0, half), wall.gap(&r1, half));
                let (vn0, vn1) = (wall.normal_velocity(&v0), wall.normal_velocity(&v1));

                if g1 < -GAP_EPS {
                    if g0 <= tol.contact_band && vn0.abs() <= tol.resting_speed {
                        out.push(WallCollision::new(i, wall.side, -g1, vn1, CollisionKind::Resting)?);
                    } else if vn1 < 0.0 || g0 >= 0.0 {
                        out.push(WallCollision::new(i, wall.side, -g1, vn1, CollisionKind::Impact)?);
                    }
                } else if g0 > 0.0 && vn0 < 0.0 && vn1 > 0.0 {
                    // Velocity reversed inside the step: assume it varied linearly and
                    // integrate it up to the turning point.
                    let s = vn0 / (vn0 - vn1);
                    let g_turn = g0 + 0.5 * vn0 * s * h;
                    if g_turn < -GAP_EPS {
                        out.push(WallCollision::new(i, wall.side, -g_turn, vn0, CollisionKind::Impact)?);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Apply the wall response to `state` for each collision and return how many
    /// atoms changed.
    ///
    /// An approaching atom's normal velocity becomes `-elasticity * v_n` (zero for
    /// resting contacts); the tangential part is untouched. A penetrating atom is
    /// moved back onto the wall face.
    ///
    /// Errors: `Error::InvalidParam` if `state` does not match the molecule.
    pub fn handle_collisions(&self, state: &mut [f64], collisions: &[WallCollision]) -> Result<usize> {
        self.check_state_len(state)?;
        let mut changed = 0;
        for c in collisions {
            let (Some(atom), Some(wall)) = (self.atoms.get(c.atom), self.walls.iter().find(|w| w.side == c.side))
            else {
                continue;
            };
            let axis = c.side.axis();
            let o = STATE_STRIDE * c.atom;
            let half = atom.shape.half_extent(axis);
            let r = [state[o], state[o + 1]];
            let v = [state[o + 2], state[o + 3]];
            let vn = wall.normal_velocity(&v);
            let mut touched = false;
            if vn < 0.0 {
                let e = match c.kind {
                    CollisionKind::Impact => self.params.elasticity,
                    CollisionKind::Resting => 0.0,
                };
                state[o + DIM + axis] = if e == 0.0 {
                    0.0
                } else {
                    c.side.inward_sign() * (-e * vn)
                };
                touched = true;
            }
            if wall.gap(&r, half) < 0.0 {
                state[o + axis] = wall.contact_coordinate(half);
                touched = true;
            }
            if touched {
                trace!(
                    "{:?} {} on {}: v_n {} -> {}",
                    c.kind,
                    atom.name,
                    c.side.name(),
                    vn,
                    c.side.inward_sign() * state[o + DIM + axis]
                );
                changed += 1;
            }
        }
        Ok(changed)
    }
}

impl OdeSystem for MoleculeSim {
    fn state_len(&self) -> usize {
        STATE_STRIDE * self.atoms.len()
    }

    /// Velocity rows pass through; acceleration is gravity plus damping plus springs.
    fn evaluate(&self, state: &[f64], _t: f64, rates: &mut [f64]) {
        let n = self.atoms.len();
        let mut force = vec![[0.0_f64; DIM]; n];
        for s in &self.springs {
            let (o1, o2) = (STATE_STRIDE * s.atom1, STATE_STRIDE * s.atom2);
            let f = s.force_on_first(&[state[o1], state[o1 + 1]], &[state[o2], state[o2 + 1]]);
            for k in 0..DIM {
                force[s.atom1][k] += f[k];
                force[s.atom2][k] -= f[k];
            }
        }
        for (i, atom) in self.atoms.iter().enumerate() {
            let o = STATE_STRIDE * i;
            let m = atom.mass;
            for k in 0..DIM {
                let vk = state[o + DIM + k];
                rates[o + k] = vk;
                rates[o + DIM + k] = (force[i][k] - self.params.damping * vk) / m;
            }
            rates[o + DIM + 1] -= self.params.gravity;
        }
    }
}
