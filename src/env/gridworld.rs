use ndarray::Array1;
use rand::{rngs::ThreadRng, Rng};

use crate::env::{Environment, Step};
use crate::error::{DeepqError, Result};
use crate::network::NeuralNetwork;
use crate::optimizer::{Adam, OptimizerWrapper};

pub const GOAL_REWARD: f32 = 10.0;
pub const PIT_REWARD: f32 = -10.0;
pub const STEP_REWARD: f32 = -1.0;

/// A cell coordinate: `x` is the row, `y` the column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

/// The four directional moves, indexed 0..4 for the action-value vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

/// How the board is laid out on reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartMode {
    /// The fixed default layout.
    Static,
    /// Fixed goal, pit, and wall; the agent starts on a random free cell.
    RandomAgent,
    /// All four pieces placed on distinct random cells.
    Random,
}

/// Piece positions for one episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub agent: Point,
    pub goal: Point,
    pub pit: Point,
    pub wall: Point,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            agent: Point::new(0, 3),
            goal: Point::new(0, 0),
            pit: Point::new(0, 1),
            wall: Point::new(1, 1),
        }
    }
}

/// Grid navigation environment.
///
/// The agent moves on a square grid toward a goal (+10), around a pit (-10)
/// and an impassable wall, paying -1 per non-terminal step so shorter paths
/// score higher. Moves off the grid or into the wall are rejected: the
/// position stays put and the step costs the ordinary -1; the episode goes
/// on. Episodes also terminate when the step budget runs out.
///
/// The state encoding is four one-hot occupancy channels (agent, goal, pit,
/// wall) flattened to `4 * size * size`.
pub struct GridWorld {
    size: usize,
    mode: StartMode,
    layout: Layout,
    steps: usize,
    step_budget: usize,
    rng: ThreadRng,
}

impl GridWorld {
    pub fn new(size: usize, mode: StartMode) -> Self {
        assert!(size >= 4, "grid must be at least 4x4 to fit the default layout");
        let mut world = GridWorld {
            size,
            mode,
            layout: Layout::default(),
            steps: 0,
            step_budget: 64,
            rng: rand::thread_rng(),
        };
        world.reset();
        world
    }

    pub fn with_step_budget(mut self, budget: usize) -> Self {
        self.step_budget = budget;
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn steps_taken(&self) -> usize {
        self.steps
    }

    /// The default approximator architecture for this environment.
    pub fn default_network(&self) -> NeuralNetwork {
        NeuralNetwork::with_relu_hidden(
            &[self.state_dim(), 150, 150, 150, 50, self.action_count()],
            OptimizerWrapper::Adam(Adam::default_params()),
        )
    }

    fn random_point(&mut self) -> Point {
        Point::new(
            self.rng.gen_range(0..self.size) as i32,
            self.rng.gen_range(0..self.size) as i32,
        )
    }

    /// A random cell not occupied by any of the given pieces.
    fn free_point(&mut self, occupied: &[Point]) -> Point {
        loop {
            let p = self.random_point();
            if !occupied.contains(&p) {
                return p;
            }
        }
    }

    fn inside(&self, p: Point) -> bool {
        p.x >= 0 && p.x < self.size as i32 && p.y >= 0 && p.y < self.size as i32
    }

    fn reward(&self) -> f32 {
        if self.layout.agent == self.layout.goal {
            GOAL_REWARD
        } else if self.layout.agent == self.layout.pit {
            PIT_REWARD
        } else {
            STEP_REWARD
        }
    }

    fn terminal(&self) -> bool {
        self.layout.agent == self.layout.goal
            || self.layout.agent == self.layout.pit
            || self.steps >= self.step_budget
    }

    /// ASCII rendering for debugging: agent A, goal G, pit P, wall W.
    pub fn render(&self) -> String {
        let mut grid = vec![vec!['\u{b7}'; self.size]; self.size];
        let mut put = |p: Point, c: char| grid[p.x as usize][p.y as usize] = c;
        put(self.layout.wall, 'W');
        put(self.layout.pit, 'P');
        put(self.layout.goal, 'G');
        put(self.layout.agent, 'A');
        grid.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Environment for GridWorld {
    fn reset(&mut self) -> Array1<f32> {
        self.steps = 0;
        self.layout = match self.mode {
            StartMode::Static => Layout::default(),
            StartMode::RandomAgent => {
                let mut layout = Layout::default();
                layout.agent = self.free_point(&[layout.goal, layout.pit, layout.wall]);
                layout
            }
            StartMode::Random => {
                let wall = self.free_point(&[]);
                let goal = self.free_point(&[wall]);
                let pit = self.free_point(&[wall, goal]);
                let agent = self.free_point(&[wall, goal, pit]);
                Layout { agent, goal, pit, wall }
            }
        };
        self.encode()
    }

    fn step(&mut self, action: usize) -> Result<Step> {
        let direction = *Direction::ALL
            .get(action)
            .ok_or(DeepqError::InvalidAction {
                action,
                max_actions: Direction::ALL.len(),
            })?;

        let (dx, dy) = direction.delta();
        let candidate = Point::new(self.layout.agent.x + dx, self.layout.agent.y + dy);
        if self.inside(candidate) && candidate != self.layout.wall {
            self.layout.agent = candidate;
        }
        self.steps += 1;

        Ok(Step {
            state: self.encode(),
            reward: self.reward(),
            done: self.terminal(),
        })
    }

    fn encode(&self) -> Array1<f32> {
        let plane = self.size * self.size;
        let mut state = Array1::zeros(4 * plane);
        for (channel, p) in [
            self.layout.agent,
            self.layout.goal,
            self.layout.pit,
            self.layout.wall,
        ]
        .iter()
        .enumerate()
        {
            state[channel * plane + p.x as usize * self.size + p.y as usize] = 1.0;
        }
        state
    }

    fn state_dim(&self) -> usize {
        4 * self.size * self.size
    }

    fn action_count(&self) -> usize {
        Direction::ALL.len()
    }
}
