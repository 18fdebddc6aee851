//! I2C EEPROM byte-store adapter (24C-style 32 kbit part).

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::error::SolError;
use crate::hardware::ByteStore;

/// Default 7-bit bus address of the EEPROM.
pub const DEFAULT_ADDRESS: u8 = 0x50;

/// Write-cycle time of the part. Each byte write must be followed by this
/// delay before the device accepts the next transaction.
const WRITE_CYCLE_MS: u32 = 5;

/// [`ByteStore`] over a two-byte-addressed I2C EEPROM.
pub struct I2cEeprom<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
}

impl<I2C, D> I2cEeprom<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self::with_address(i2c, delay, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, delay: D, address: u8) -> Self {
        Self { i2c, delay, address }
    }

    /// Releases the bus and delay peripherals.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

impl<I2C, D> ByteStore for I2cEeprom<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    fn read_byte(&mut self, address: u16) -> Result<u8, SolError> {
        let pointer = address.to_be_bytes();
        let mut value = [0u8; 1];
        self.i2c
            .write_read(self.address, &pointer, &mut value)
            .map_err(|_| SolError::StorageFault)?;
        Ok(value[0])
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), SolError> {
        let pointer = address.to_be_bytes();
        let frame = [pointer[0], pointer[1], value];
        self.i2c
            .write(self.address, &frame)
            .map_err(|_| SolError::StorageFault)?;
        self.delay.delay_ms(WRITE_CYCLE_MS);
        Ok(())
    }
}
