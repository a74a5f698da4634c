//! ASCII legend shared with the map materializer.
//!
//! Each byte maps to exactly one fixture kind. The materializer walks an
//! accepted grid once and spawns an entity per non-structural byte, so these
//! values are a wire format and must stay in sync with it.

/// Outer or interior wall.
pub const WALL: u8 = b'#';
/// Alternate wall style, structurally identical to `WALL`.
pub const WALL2: u8 = b'w';
/// Walkable floor.
pub const EMPTY: u8 = b'.';
/// Unique origin marker.
pub const ORIGIN: u8 = b'0';
/// Uncollapsed solver cell.
pub const UNKNOWN: u8 = b'?';
/// Blank filler, treated as floor.
pub const BLANK: u8 = b' ';

/// A pre-placed customer.
pub const CUSTOMER: u8 = b'c';
/// Customer spawner.
pub const CUST_SPAWNER: u8 = b'C';
/// Register with a waiting queue.
pub const REGISTER: u8 = b'R';
/// Table.
pub const TABLE: u8 = b't';
/// Grabber facing up.
pub const GRABBER_UP: u8 = b'^';
/// Grabber facing left.
pub const GRABBER_LEFT: u8 = b'<';
/// Grabber facing right.
pub const GRABBER_RIGHT: u8 = b'>';
/// Grabber facing down.
pub const GRABBER_DOWN: u8 = b'v';
/// Medicine cabinet.
pub const MEDICINE_CABINET: u8 = b'M';
/// Fruit dispenser.
pub const FRUIT: u8 = b'F';
/// Blender.
pub const BLENDER: u8 = b'b';
/// Soda machine.
pub const SODA_MACHINE: u8 = b'S';
/// Cupboard.
pub const CUPBOARD: u8 = b'd';
/// Lemon dispenser.
pub const LEMON: u8 = b'l';
/// Simple syrup holder.
pub const SIMPLE_SYRUP: u8 = b'y';
/// Squirter.
pub const SQUIRTER: u8 = b'q';
/// Trash can.
pub const TRASH: u8 = b'g';
/// Filtered grabber.
pub const FILTERED_GRABBER: u8 = b'G';
/// Pneumatic pipe.
pub const PNUMATIC_PIPE: u8 = b'p';
/// Mop holder.
pub const MOP_HOLDER: u8 = b'm';
/// Fast-forward trigger.
pub const FAST_FORWARD: u8 = b'f';
/// Mop buddy holder.
pub const MOP_BUDDY: u8 = b'B';
/// The named "Sophie" fixture.
pub const SOPHIE: u8 = b'+';

/// Length of the floor strip east of a register where customers line up.
pub const QUEUE_LENGTH: usize = 3;

/// Returns true for either wall byte.
pub const fn is_wall(ch: u8) -> bool {
    ch == WALL || ch == WALL2
}

/// Bytes that survive layout scrubbing.
pub const fn is_structural(ch: u8) -> bool {
    is_wall(ch) || ch == EMPTY || ch == ORIGIN
}

/// Routing treats only floor and origin as passable.
pub const fn is_walkable_for_routing(ch: u8) -> bool {
    ch == EMPTY || ch == ORIGIN
}

/// Structural connectivity treats anything that is not a wall as walkable.
pub const fn is_walkable_ascii(ch: u8) -> bool {
    !is_wall(ch)
}

/// Facing of a grabber fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facing {
    /// Towards row 0.
    Up,
    /// Towards the last row.
    Down,
    /// Towards column 0.
    Left,
    /// Towards the last column.
    Right,
}

/// Every entity kind the materializer can spawn from a single byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FixtureKind {
    /// `#`
    Wall,
    /// `w`
    AltWall,
    /// `0`
    Origin,
    /// `c`
    Customer,
    /// `C`
    CustomerSpawner,
    /// `R`
    Register,
    /// `t`
    Table,
    /// `^`
    GrabberUp,
    /// `<`
    GrabberLeft,
    /// `>`
    GrabberRight,
    /// `v`
    GrabberDown,
    /// `M`
    MedicineCabinet,
    /// `F`
    FruitDispenser,
    /// `b`
    Blender,
    /// `S`
    SodaMachine,
    /// `d`
    Cupboard,
    /// `l`
    Lemon,
    /// `y`
    SimpleSyrup,
    /// `q`
    Squirter,
    /// `g`
    Trash,
    /// `G`
    FilteredGrabber,
    /// `p`
    PneumaticPipe,
    /// `m`
    MopHolder,
    /// `f`
    FastForward,
    /// `B`
    MopBuddy,
    /// `+`
    Sophie,
}

impl FixtureKind {
    /// Every kind, in legend order.
    pub const ALL: [Self; 26] = [
        Self::Wall,
        Self::AltWall,
        Self::Origin,
        Self::Customer,
        Self::CustomerSpawner,
        Self::Register,
        Self::Table,
        Self::GrabberUp,
        Self::GrabberLeft,
        Self::GrabberRight,
        Self::GrabberDown,
        Self::MedicineCabinet,
        Self::FruitDispenser,
        Self::Blender,
        Self::SodaMachine,
        Self::Cupboard,
        Self::Lemon,
        Self::SimpleSyrup,
        Self::Squirter,
        Self::Trash,
        Self::FilteredGrabber,
        Self::PneumaticPipe,
        Self::MopHolder,
        Self::FastForward,
        Self::MopBuddy,
        Self::Sophie,
    ];

    /// Decodes a legend byte. Floor and empty markers map to `None`.
    pub const fn from_symbol(ch: u8) -> Option<Self> {
        let kind = match ch {
            WALL => Self::Wall,
            WALL2 => Self::AltWall,
            ORIGIN => Self::Origin,
            CUSTOMER => Self::Customer,
            CUST_SPAWNER => Self::CustomerSpawner,
            REGISTER => Self::Register,
            TABLE => Self::Table,
            GRABBER_UP => Self::GrabberUp,
            GRABBER_LEFT => Self::GrabberLeft,
            GRABBER_RIGHT => Self::GrabberRight,
            GRABBER_DOWN => Self::GrabberDown,
            MEDICINE_CABINET => Self::MedicineCabinet,
            FRUIT => Self::FruitDispenser,
            BLENDER => Self::Blender,
            SODA_MACHINE => Self::SodaMachine,
            CUPBOARD => Self::Cupboard,
            LEMON => Self::Lemon,
            SIMPLE_SYRUP => Self::SimpleSyrup,
            SQUIRTER => Self::Squirter,
            TRASH => Self::Trash,
            FILTERED_GRABBER => Self::FilteredGrabber,
            PNUMATIC_PIPE => Self::PneumaticPipe,
            MOP_HOLDER => Self::MopHolder,
            FAST_FORWARD => Self::FastForward,
            MOP_BUDDY => Self::MopBuddy,
            SOPHIE => Self::Sophie,
            _ => return None,
        };
        Some(kind)
    }

    /// Encodes this kind as its legend byte.
    pub const fn symbol(self) -> u8 {
        match self {
            Self::Wall => WALL,
            Self::AltWall => WALL2,
            Self::Origin => ORIGIN,
            Self::Customer => CUSTOMER,
            Self::CustomerSpawner => CUST_SPAWNER,
            Self::Register => REGISTER,
            Self::Table => TABLE,
            Self::GrabberUp => GRABBER_UP,
            Self::GrabberLeft => GRABBER_LEFT,
            Self::GrabberRight => GRABBER_RIGHT,
            Self::GrabberDown => GRABBER_DOWN,
            Self::MedicineCabinet => MEDICINE_CABINET,
            Self::FruitDispenser => FRUIT,
            Self::Blender => BLENDER,
            Self::SodaMachine => SODA_MACHINE,
            Self::Cupboard => CUPBOARD,
            Self::Lemon => LEMON,
            Self::SimpleSyrup => SIMPLE_SYRUP,
            Self::Squirter => SQUIRTER,
            Self::Trash => TRASH,
            Self::FilteredGrabber => FILTERED_GRABBER,
            Self::PneumaticPipe => PNUMATIC_PIPE,
            Self::MopHolder => MOP_HOLDER,
            Self::FastForward => FAST_FORWARD,
            Self::MopBuddy => MOP_BUDDY,
            Self::Sophie => SOPHIE,
        }
    }

    /// Facing of grabber kinds, `None` for everything else.
    pub const fn facing(self) -> Option<Facing> {
        match self {
            Self::GrabberUp => Some(Facing::Up),
            Self::GrabberDown => Some(Facing::Down),
            Self::GrabberLeft => Some(Facing::Left),
            Self::GrabberRight => Some(Facing::Right),
            _ => None,
        }
    }

    /// Walls and origin shape the room; everything else is furniture.
    pub const fn is_structural(self) -> bool {
        matches!(self, Self::Wall | Self::AltWall | Self::Origin)
    }
}

/// Fixtures every accepted map must contain, with their report labels.
pub const REQUIRED_SYMBOLS: [(u8, &str); 8] = [
    (CUST_SPAWNER, "CustomerSpawner (C)"),
    (REGISTER, "Register (R)"),
    (SODA_MACHINE, "SodaMachine (S)"),
    (CUPBOARD, "Cupboard (d)"),
    (TRASH, "Trash (g)"),
    (FAST_FORWARD, "FastForward (f)"),
    (SOPHIE, "Sophie (+)"),
    (TABLE, "Table (t)"),
];
