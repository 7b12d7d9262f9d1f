//! Byte-level assertion helpers shared by the session decoders.
//!
//! Every check takes the error to return on failure so callers keep their own
//! error taxonomy (and can embed the observed length in it).

macro_rules! session_assert {
  ($func_name:ident, $($param:ident: $type:ty),* $(,)? | $check:expr) => {
      #[inline(always)]
      pub fn $func_name<E>($($param: $type,)* error: E) -> Result<(), E> {
          if $check {
              Ok(())
          } else {
              Err(error)
          }
      }
  };
}

macro_rules! session_assert_return {
  ($func_name:ident, $return_type:ty, $($param:ident: $type:ty),* $(,)? | $check:expr) => {
      #[inline(always)]
      pub fn $func_name<E>($($param: $type,)* error: E) -> Result<$return_type, E> {
          match $check {
              Some(value) => Ok(value),
              None => Err(error),
          }
      }
  };
}

session_assert!(check_min_len, data: &[u8], min: usize |
  data.len() >= min
);

session_assert!(check_zero_bytes, data: &[u8] |
  data.iter().all(|byte| *byte == 0)
);

session_assert!(check_max_count, count: usize, max: usize |
  count <= max
);

session_assert_return!(read_array20, [u8; 20], data: &[u8], offset: usize |
  offset.checked_add(20).and_then(|end| data.get(offset..end)).and_then(|s| s.try_into().ok())
);

session_assert_return!(read_array32, [u8; 32], data: &[u8], offset: usize |
  offset.checked_add(32).and_then(|end| data.get(offset..end)).and_then(|s| s.try_into().ok())
);

session_assert_return!(read_selector, [u8; 4], data: &[u8] |
  data.get(..4).and_then(|s| s.try_into().ok())
);
