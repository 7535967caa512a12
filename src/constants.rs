//! Protocol constants and RSA strength bounds.

use num_traits::One;
use rsa::BigUint;

use crate::Error;

/// HKDF `info` label used when deriving an exponent from public metadata.
pub const PUBLIC_METADATA_HKDF_INFO: &[u8] = b"PBRSA";

/// Extra HKDF output bytes generated beyond the exponent length and then
/// discarded, so that the truncated output stays indistinguishable from random.
pub const HKDF_EXTRA_BYTES: usize = 16;

/// Smallest accepted RSA modulus, in bits.
pub const MIN_MODULUS_BITS: usize = 1024;

/// Largest accepted RSA modulus, in bits.
pub const MAX_MODULUS_BITS: usize = 4096;

/// ⌊2^2047 × √2⌋, least significant word first.
const RSA_SQRT_TWO: [u64; 32] = [
    0x4d7c_60a5_e633_e3e1,
    0x5fcf_8f7b_ca3e_a33b,
    0xc246_785e_9295_7023,
    0xf9ac_ce41_797f_2805,
    0xfdfe_170f_d3b1_f780,
    0xd24f_4a76_3fac_b882,
    0x1883_8a2e_aff5_f3b2,
    0xc1fc_bdde_a2f7_dc33,
    0xdea0_6241_f7aa_81c2,
    0xf6a1_be3f_ca22_1307,
    0x332a_5e9f_7bda_1ebf,
    0x0104_dc01_fe32_352f,
    0xb8cf_341b_6f82_36c7,
    0x4264_dabc_d528_b651,
    0xf4d3_a02c_ebc9_3e0c,
    0x8139_4ab6_d8fd_0efd,
    0xeaa4_a089_9040_ca4a,
    0xf52f_120f_836e_582e,
    0xcb2a_6343_31f3_c84d,
    0xc6d5_a8a3_8bb7_e9dc,
    0x460a_bc72_2f7c_4e33,
    0xcab1_bc91_1688_458a,
    0x5305_9c60_11bc_337b,
    0xd220_2e87_42af_1f4e,
    0x7804_8736_3dfa_2768,
    0x0f74_a85e_439c_7b4a,
    0xa8b1_fe6f_dc83_db39,
    0x4afc_8304_3ab8_a2c3,
    0xed17_ac85_8333_9915,
    0x1d6f_60ba_893b_a84c,
    0x597d_89b3_754a_be9f,
    0xb504_f333_f9de_6484,
];

const RSA_SQRT_TWO_BITS: usize = 64 * RSA_SQRT_TWO.len();

/// Compute 2^(bits - 1/2), the smallest acceptable value for a prime factor
/// of a `2 * bits`-bit strong RSA modulus.
///
/// Below 2048 bits the result is the floor of 2^(bits - 1/2). From 2048 bits
/// up, one is added to the table value before shifting, so the result is an
/// upper bound (the ceiling at exactly 2048 bits).
pub fn sqrt_two_scaled(bits: i32) -> Result<BigUint, Error> {
    if bits < 0 {
        return Err(Error::InternalError);
    }
    let bits = bits as usize;

    let mut sqrt2 = RSA_SQRT_TWO
        .iter()
        .rev()
        .fold(BigUint::from(0u8), |acc, word| {
            (acc << 64usize) + BigUint::from(*word)
        });
    if sqrt2.bits() != RSA_SQRT_TWO_BITS {
        return Err(Error::InternalError);
    }

    if RSA_SQRT_TWO_BITS > bits {
        sqrt2 = sqrt2 >> (RSA_SQRT_TWO_BITS - bits);
    } else {
        sqrt2 = (sqrt2 + BigUint::one()) << (bits - RSA_SQRT_TWO_BITS);
    }

    if sqrt2.bits() != bits {
        return Err(Error::InternalError);
    }
    Ok(sqrt2)
}

/// Compute 2^x.
pub fn power_of_two(x: i32) -> Result<BigUint, Error> {
    if x < 0 {
        return Err(Error::InternalError);
    }
    Ok(BigUint::one() << (x as usize))
}
