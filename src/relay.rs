//! Work states and remote commands of a relay-driven actuator (shutter
//! motor with an up and a down relay).

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum WorkState {
    #[default]
    Invalid = 0,
    Idle = 1,
    Up = 2,
    Down = 3,
    /// An actuation is in flight; incoming commands are discarded, which
    /// also swallows contact bounce on the inputs.
    Changing = 4,
}

impl WorkState {
    /// Idle, Up and Down. Changing is transitional and Invalid is never
    /// reached on purpose.
    pub const fn is_stable(self) -> bool {
        matches!(self, WorkState::Idle | WorkState::Up | WorkState::Down)
    }

    pub const fn accepts_commands(self) -> bool {
        self.is_stable()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            WorkState::Invalid => "INVALID",
            WorkState::Idle => "IDLE",
            WorkState::Up => "UP",
            WorkState::Down => "DOWN",
            WorkState::Changing => "CHANGING",
        }
    }
}

impl TryFrom<u8> for WorkState {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(WorkState::Invalid),
            1 => Ok(WorkState::Idle),
            2 => Ok(WorkState::Up),
            3 => Ok(WorkState::Down),
            4 => Ok(WorkState::Changing),
            other => Err(other),
        }
    }
}

impl ufmt::uDisplay for WorkState {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Command {
    /// No command received
    #[default]
    Na = 0,
    Stop = 1,
    Up = 2,
    Down = 3,
}

impl Command {
    pub const fn as_str(self) -> &'static str {
        match self {
            Command::Na => "NA",
            Command::Stop => "STOP",
            Command::Up => "UP",
            Command::Down => "DOWN",
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Command::Na),
            1 => Ok(Command::Stop),
            2 => Ok(Command::Up),
            3 => Ok(Command::Down),
            other => Err(other),
        }
    }
}

impl ufmt::uDisplay for Command {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(self.as_str())
    }
}
