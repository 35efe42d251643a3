use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::SimConfig;
use crate::core::point_mass::{PointMass, DIM};
use crate::core::{CollisionAdvance, MoleculeSim, Parameter};

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn to_array(atoms: &[PointMass], pick: impl Fn(&PointMass) -> [f64; DIM]) -> Array2<f64> {
    let mut arr = Array2::<f64>::zeros((atoms.len(), DIM));
    for (i, a) in atoms.iter().enumerate() {
        for (k, v) in pick(a).into_iter().enumerate() {
            arr[[i, k]] = v;
        }
    }
    arr
}

/// Python-facing wrapper around the molecule core and its advancer.
///
/// API:
/// - __new__(num_atoms, seed=None, config_json=None)
/// - configure(num_atoms)
/// - advance(delta_t) -> (sub_steps, collisions, completed)
/// - get_positions() / get_velocities() -> np.ndarray, shape (N, 2)
/// - get_parameter(name) / set_parameter(name, value)
#[pyclass(unsendable)]
pub struct Molecule {
    sim: MoleculeSim,
    advance: CollisionAdvance,
}

#[pymethods]
impl Molecule {
    /// Build a molecule of `num_atoms` atoms (2..=6).
    ///
    /// Parameters
    /// - num_atoms: number of atoms
    /// - seed: RNG seed for initial velocities; overrides the config's seed
    /// - config_json: optional JSON document with `SimConfig` fields
    ///
    /// Errors: raises ValueError on invalid configuration.
    #[new]
    #[pyo3(signature = (num_atoms, seed=None, config_json=None))]
    fn new(num_atoms: usize, seed: Option<u64>, config_json: Option<&str>) -> PyResult<Self> {
        let mut config = match config_json {
            Some(s) => SimConfig::from_json_str(s).map_err(py_err)?,
            None => SimConfig::default(),
        };
        if seed.is_some() {
            config.seed = seed;
        }
        let sim = MoleculeSim::with_atoms(num_atoms, &config).map_err(py_err)?;
        let advance = CollisionAdvance::new(&config).map_err(py_err)?;
        Ok(Self { sim, advance })
    }

    /// Rebuild the molecule with a new atom count; time restarts at 0.
    fn configure(&mut self, num_atoms: usize) -> PyResult<()> {
        self.sim.configure(num_atoms).map_err(py_err)
    }

    /// Advance by `delta_t`. Returns (sub_steps, collisions, completed); `completed` is
    /// False when the sub-step limit stopped the call early.
    fn advance(&mut self, delta_t: f64) -> PyResult<(usize, usize, bool)> {
        let r = self.advance.advance(&mut self.sim, delta_t).map_err(py_err)?;
        Ok((r.sub_steps, r.collisions, r.completed()))
    }

    /// Advance to the absolute `target_time`.
    fn advance_to(&mut self, target_time: f64) -> PyResult<(usize, usize, bool)> {
        let r = self
            .advance
            .advance_to(&mut self.sim, target_time)
            .map_err(py_err)?;
        Ok((r.sub_steps, r.collisions, r.completed()))
    }

    #[getter]
    fn time(&self) -> f64 {
        self.sim.time()
    }

    /// Atom positions as a NumPy array of shape (N, 2), dtype=float64.
    fn get_positions<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray2<f64>>> {
        let arr = to_array(self.sim.atoms(), |a| a.r);
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Atom velocities as a NumPy array of shape (N, 2), dtype=float64.
    fn get_velocities<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray2<f64>>> {
        let arr = to_array(self.sim.atoms(), |a| a.v);
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Read a named parameter, e.g. "gravity" or "stiffness_special".
    fn get_parameter(&self, name: &str) -> PyResult<f64> {
        let p: Parameter = name.parse().map_err(py_err)?;
        Ok(self.sim.parameter(p))
    }

    fn set_parameter(&mut self, name: &str, value: f64) -> PyResult<()> {
        let p: Parameter = name.parse().map_err(py_err)?;
        self.sim.set_parameter(p, value).map_err(py_err)
    }

    /// (kinetic, spring potential, gravity potential, total)
    fn get_energy(&self) -> (f64, f64, f64, f64) {
        let e = self.sim.energy();
        (e.kinetic, e.spring_potential, e.gravity_potential, e.total())
    }

    /// Names of every live entity in registration order.
    fn entity_names(&self) -> Vec<String> {
        self.sim
            .sim_list()
            .iter()
            .map(|o| o.name().to_string())
            .collect()
    }
}

/// The molsim Python module entry point.
#[pymodule]
fn molsim(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Molecule>()?;
    Ok(())
}
