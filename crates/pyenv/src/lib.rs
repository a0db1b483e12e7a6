use aircombat_shared::*;
use aircombat_sim::{build_environment, Environment, StepOutcome};
use numpy::{PyArray1, PyArray2, PyArrayMethods, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use rayon::prelude::*;

fn value_error(e: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn engagement_config(
    model: &str,
    scenario: &str,
    seed: u64,
    randomize_red: bool,
    randomize_blue: bool,
    fuel_budget: Option<i32>,
) -> PyResult<EngagementConfig> {
    let mut config = EngagementConfig::with_model(model.parse().map_err(value_error)?);
    config.scenario.mode = scenario.parse().map_err(value_error)?;
    config.scenario.randomize_red = randomize_red;
    config.scenario.randomize_blue = randomize_blue;
    config.seed = seed;
    if let Some(fuel) = fuel_budget {
        config.fuel_budget = fuel;
    }
    config.validate().map_err(value_error)?;
    Ok(config)
}

fn apply_shaping(
    current: ShapingConfig,
    potential_scale: Option<f64>,
    distance_scale: Option<f64>,
    time_cost: Option<f64>,
) -> PyResult<ShapingConfig> {
    let mut shaping = current;
    if let Some(v) = potential_scale {
        shaping.potential_scale = v;
    }
    if let Some(v) = distance_scale {
        shaping.distance_scale = v;
    }
    if let Some(v) = time_cost {
        shaping.time_cost = v;
    }
    shaping.validate().map_err(value_error)?;
    Ok(shaping)
}

fn snapshot_dict<'py>(py: Python<'py>, s: &AircraftSnapshot) -> PyResult<Bound<'py, PyDict>> {
    let d = PyDict::new_bound(py);
    d.set_item("x", s.x)?;
    d.set_item("y", s.y)?;
    d.set_item("altitude", s.altitude)?;
    d.set_item("heading", s.heading)?;
    d.set_item("pitch", s.pitch)?;
    d.set_item("bank", s.bank)?;
    d.set_item("speed", s.speed)?;
    d.set_item("fuel", s.fuel)?;
    Ok(d)
}

// ---------------------------------------------------------------------------
// Single env
// ---------------------------------------------------------------------------

/// Two-agent self-play environment. Both sides act every step.
///
/// Usage:
///     env = AirCombatEnv("planar", "neutral", seed=42)
///     obs_red, obs_blue = env.reset()
///     obs_red, obs_blue, r_blue, r_red, done, info = env.step(1, 1)
#[pyclass(unsendable)]
struct AirCombatEnv {
    env: Box<dyn Environment>,
}

#[pymethods]
impl AirCombatEnv {
    #[new]
    #[pyo3(signature = (model="planar", scenario="neutral", seed=0, randomize_red=false, randomize_blue=false, fuel_budget=None))]
    fn new(
        model: &str,
        scenario: &str,
        seed: u64,
        randomize_red: bool,
        randomize_blue: bool,
        fuel_budget: Option<i32>,
    ) -> PyResult<Self> {
        let config =
            engagement_config(model, scenario, seed, randomize_red, randomize_blue, fuel_budget)?;
        let env = build_environment(config).map_err(value_error)?;
        Ok(Self { env })
    }

    /// Override reward-shaping constants. Keyword-only arguments.
    #[pyo3(signature = (potential_scale=None, distance_scale=None, time_cost=None))]
    fn set_shaping(
        &mut self,
        potential_scale: Option<f64>,
        distance_scale: Option<f64>,
        time_cost: Option<f64>,
    ) -> PyResult<()> {
        let shaping = apply_shaping(
            self.env.config().shaping,
            potential_scale,
            distance_scale,
            time_cost,
        )?;
        self.env.set_shaping(shaping).map_err(value_error)
    }

    /// Reset the episode. Returns (obs_red, obs_blue).
    #[pyo3(signature = (seed=None))]
    fn reset(&mut self, seed: Option<u64>) -> (Vec<f32>, Vec<f32>) {
        let (red, blue) = match seed {
            Some(s) => self.env.reset_with_seed(s),
            None => self.env.reset(),
        };
        (red.data, blue.data)
    }

    /// Step both aircraft with integer commands.
    /// Returns (obs_red, obs_blue, reward_blue, reward_red, done, info_dict).
    #[allow(clippy::type_complexity)]
    fn step<'py>(
        &mut self,
        py: Python<'py>,
        action_blue: i64,
        action_red: i64,
    ) -> PyResult<(Vec<f32>, Vec<f32>, f64, f64, bool, Bound<'py, PyDict>)> {
        let out = self
            .env
            .step_raw(action_blue, action_red)
            .map_err(value_error)?;

        let info = PyDict::new_bound(py);
        info.set_item("step", self.env.steps())?;
        info.set_item("advantage", self.env.advantage_count())?;
        info.set_item("outcome", format!("{:?}", out.outcome))?;
        info.set_item("reason", out.reason.map(|r| format!("{:?}", r)))?;

        Ok((
            out.obs_red.data,
            out.obs_blue.data,
            out.reward_blue,
            out.reward_red,
            out.done,
            info,
        ))
    }

    /// Current aircraft states as {"red": {...}, "blue": {...}}.
    fn aircraft<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let (red, blue) = self.env.snapshots();
        let d = PyDict::new_bound(py);
        d.set_item("red", snapshot_dict(py, &red)?)?;
        d.set_item("blue", snapshot_dict(py, &blue)?)?;
        Ok(d)
    }

    #[getter]
    fn obs_size(&self) -> usize {
        self.env.obs_size()
    }

    /// Number of discrete commands per aircraft.
    #[getter]
    fn n_actions(&self) -> u8 {
        self.env.command_count()
    }

    #[getter]
    fn current_step(&self) -> u32 {
        self.env.steps()
    }

    #[getter]
    fn advantage(&self) -> i32 {
        self.env.advantage_count()
    }

    #[getter]
    fn done(&self) -> bool {
        self.env.is_done()
    }
}

// ---------------------------------------------------------------------------
// Batched env
// ---------------------------------------------------------------------------

/// Vectorized self-play environment that steps all N engagements in
/// parallel using Rayon. Finished engagements reset automatically with a
/// fresh seed; their returned observation is the first of the new episode.
///
/// Usage:
///     batch = BatchEnv(64, "planar", "random", seed=0)
///     obs_red, obs_blue = batch.reset()        # each (64, OBS_SIZE)
///     obs_red, obs_blue, r_blue, r_red, dones, infos = batch.step(a_blue, a_red)
#[pyclass(unsendable)]
struct BatchEnv {
    envs: Vec<Box<dyn Environment>>,
    n_envs: usize,
    obs_size: usize,
    rng: Pcg64,
}

impl BatchEnv {
    fn write_obs<'py>(
        &self,
        py: Python<'py>,
        rows: &[(Observation, Observation)],
    ) -> (Bound<'py, PyArray2<f32>>, Bound<'py, PyArray2<f32>>) {
        let n = self.obs_size;
        let red_py = PyArray2::<f32>::zeros_bound(py, [self.n_envs, n], false);
        let blue_py = PyArray2::<f32>::zeros_bound(py, [self.n_envs, n], false);
        // Freshly allocated, C-contiguous and not shared with Python yet.
        unsafe {
            if let (Ok(red_buf), Ok(blue_buf)) = (red_py.as_slice_mut(), blue_py.as_slice_mut()) {
                for (i, (red, blue)) in rows.iter().enumerate() {
                    red_buf[i * n..(i + 1) * n].copy_from_slice(&red.data);
                    blue_buf[i * n..(i + 1) * n].copy_from_slice(&blue.data);
                }
            }
        }
        (red_py, blue_py)
    }
}

#[pymethods]
impl BatchEnv {
    #[new]
    #[pyo3(signature = (n_envs, model="planar", scenario="random", seed=0, randomize_red=false, randomize_blue=false, fuel_budget=None))]
    fn new(
        n_envs: usize,
        model: &str,
        scenario: &str,
        seed: u64,
        randomize_red: bool,
        randomize_blue: bool,
        fuel_budget: Option<i32>,
    ) -> PyResult<Self> {
        if n_envs == 0 {
            return Err(PyValueError::new_err("n_envs must be positive"));
        }
        let mut rng = Pcg64::seed_from_u64(seed);
        let envs = (0..n_envs)
            .map(|_| {
                let config = engagement_config(
                    model,
                    scenario,
                    rng.gen::<u64>(),
                    randomize_red,
                    randomize_blue,
                    fuel_budget,
                )?;
                build_environment(config).map_err(value_error)
            })
            .collect::<PyResult<Vec<_>>>()?;
        let obs_size = envs[0].obs_size();

        Ok(Self {
            envs,
            n_envs,
            obs_size,
            rng,
        })
    }

    /// Override reward-shaping constants on every engagement.
    #[pyo3(signature = (potential_scale=None, distance_scale=None, time_cost=None))]
    fn set_shaping(
        &mut self,
        potential_scale: Option<f64>,
        distance_scale: Option<f64>,
        time_cost: Option<f64>,
    ) -> PyResult<()> {
        let shaping = apply_shaping(
            self.envs[0].config().shaping,
            potential_scale,
            distance_scale,
            time_cost,
        )?;
        for env in &mut self.envs {
            env.set_shaping(shaping).map_err(value_error)?;
        }
        Ok(())
    }

    /// Reset all engagements. Returns (obs_red, obs_blue), each
    /// (n_envs, OBS_SIZE) float32.
    fn reset<'py>(
        &mut self,
        py: Python<'py>,
    ) -> (Bound<'py, PyArray2<f32>>, Bound<'py, PyArray2<f32>>) {
        // Seeds drawn sequentially so results do not depend on thread count.
        let seeds: Vec<u64> = (0..self.n_envs).map(|_| self.rng.gen::<u64>()).collect();
        let rows: Vec<(Observation, Observation)> = self
            .envs
            .par_iter_mut()
            .zip(seeds.into_par_iter())
            .map(|(env, seed)| env.reset_with_seed(seed))
            .collect();
        self.write_obs(py, &rows)
    }

    /// Step all engagements in parallel.
    ///
    /// Args:
    ///     actions_blue, actions_red: numpy (n_envs,) int64
    ///
    /// Returns: (obs_red, obs_blue, rewards_blue, rewards_red, dones, infos)
    ///     infos: list of n_envs dicts (only populated for finished episodes)
    #[allow(clippy::type_complexity)]
    fn step<'py>(
        &mut self,
        py: Python<'py>,
        actions_blue: PyReadonlyArray1<i64>,
        actions_red: PyReadonlyArray1<i64>,
    ) -> PyResult<(
        Bound<'py, PyArray2<f32>>,
        Bound<'py, PyArray2<f32>>,
        Bound<'py, PyArray1<f64>>,
        Bound<'py, PyArray1<f64>>,
        Bound<'py, PyArray1<bool>>,
        Bound<'py, PyList>,
    )> {
        let blue = actions_blue.as_array();
        let red = actions_red.as_array();
        if blue.len() != self.n_envs || red.len() != self.n_envs {
            return Err(PyValueError::new_err(format!(
                "expected {} actions per side, got {} blue and {} red",
                self.n_envs,
                blue.len(),
                red.len()
            )));
        }
        let commands: Vec<(i64, i64)> = blue.iter().copied().zip(red.iter().copied()).collect();
        // Reject the whole batch before any engagement moves, so a bad
        // command never strands finished episodes without their reset.
        for (i, (env, &(b, r))) in self.envs.iter().zip(&commands).enumerate() {
            env.check_commands(b, r)
                .map_err(|e| PyValueError::new_err(format!("env {}: {}", i, e)))?;
        }

        let results: Vec<StepOutcome> = self
            .envs
            .par_iter_mut()
            .zip(commands.into_par_iter())
            .map(|(env, (b, r))| env.step_raw(b, r))
            .collect::<Result<_, SimError>>()
            .map_err(value_error)?;

        let reset_seeds: Vec<Option<u64>> = results
            .iter()
            .map(|r| r.done.then(|| self.rng.gen::<u64>()))
            .collect();

        let rows: Vec<(Observation, Observation)> = self
            .envs
            .par_iter_mut()
            .zip(reset_seeds.into_par_iter())
            .zip(results.par_iter())
            .map(|((env, seed), result)| match seed {
                Some(seed) => env.reset_with_seed(seed),
                None => (result.obs_red.clone(), result.obs_blue.clone()),
            })
            .collect();

        let (obs_red, obs_blue) = self.write_obs(py, &rows);
        let rew_blue: Vec<f64> = results.iter().map(|r| r.reward_blue).collect();
        let rew_red: Vec<f64> = results.iter().map(|r| r.reward_red).collect();
        let dones: Vec<bool> = results.iter().map(|r| r.done).collect();

        let infos = PyList::empty_bound(py);
        for result in &results {
            let info = PyDict::new_bound(py);
            if result.done {
                info.set_item("outcome", format!("{:?}", result.outcome))?;
                info.set_item("reason", result.reason.map(|r| format!("{:?}", r)))?;
            }
            infos.append(info)?;
        }

        Ok((
            obs_red,
            obs_blue,
            PyArray1::from_vec_bound(py, rew_blue),
            PyArray1::from_vec_bound(py, rew_red),
            PyArray1::from_vec_bound(py, dones),
            infos,
        ))
    }

    /// Number of environments.
    #[getter]
    fn n(&self) -> usize {
        self.n_envs
    }

    #[getter]
    fn obs_size(&self) -> usize {
        self.obs_size
    }

    #[getter]
    fn n_actions(&self) -> u8 {
        self.envs[0].command_count()
    }
}

/// Python module definition.
#[pymodule]
fn aircombat_pyenv(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<AirCombatEnv>()?;
    m.add_class::<BatchEnv>()?;
    m.add("OBS_SIZE", OBS_SIZE)?;
    m.add("PLANAR_ACTIONS", PLANAR_COMMAND_COUNT)?;
    m.add("ENERGY_ACTIONS", ENERGY_COMMAND_COUNT)?;
    m.add("ADVANTAGE_WIN_THRESHOLD", ADVANTAGE_WIN_THRESHOLD)?;
    Ok(())
}
