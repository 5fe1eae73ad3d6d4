//! Query planning support (`xBestIndex`)

use crate::error::Result;
use libsqlite3_sys as ffi;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_uchar};
use std::slice;

/// Operator of a `WHERE` term offered to a virtual table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    Eq,
    Gt,
    Le,
    Lt,
    Ge,
    Match,
    Like,
    Glob,
    Regexp,
    Ne,
    IsNot,
    IsNotNull,
    IsNull,
    Is,
    Limit,
    Offset,
    /// Overloaded function registered through `xFindFunction`
    Function(u8),
    Unknown(u8),
}

impl ConstraintOp {
    pub fn from_raw(op: c_uchar) -> Self {
        match op as c_int {
            ffi::SQLITE_INDEX_CONSTRAINT_EQ => ConstraintOp::Eq,
            ffi::SQLITE_INDEX_CONSTRAINT_GT => ConstraintOp::Gt,
            ffi::SQLITE_INDEX_CONSTRAINT_LE => ConstraintOp::Le,
            ffi::SQLITE_INDEX_CONSTRAINT_LT => ConstraintOp::Lt,
            ffi::SQLITE_INDEX_CONSTRAINT_GE => ConstraintOp::Ge,
            ffi::SQLITE_INDEX_CONSTRAINT_MATCH => ConstraintOp::Match,
            ffi::SQLITE_INDEX_CONSTRAINT_LIKE => ConstraintOp::Like,
            ffi::SQLITE_INDEX_CONSTRAINT_GLOB => ConstraintOp::Glob,
            ffi::SQLITE_INDEX_CONSTRAINT_REGEXP => ConstraintOp::Regexp,
            ffi::SQLITE_INDEX_CONSTRAINT_NE => ConstraintOp::Ne,
            ffi::SQLITE_INDEX_CONSTRAINT_ISNOT => ConstraintOp::IsNot,
            ffi::SQLITE_INDEX_CONSTRAINT_ISNOTNULL => ConstraintOp::IsNotNull,
            ffi::SQLITE_INDEX_CONSTRAINT_ISNULL => ConstraintOp::IsNull,
            ffi::SQLITE_INDEX_CONSTRAINT_IS => ConstraintOp::Is,
            ffi::SQLITE_INDEX_CONSTRAINT_LIMIT => ConstraintOp::Limit,
            ffi::SQLITE_INDEX_CONSTRAINT_OFFSET => ConstraintOp::Offset,
            n if n >= ffi::SQLITE_INDEX_CONSTRAINT_FUNCTION => ConstraintOp::Function(op),
            _ => ConstraintOp::Unknown(op),
        }
    }
}

/// A single `WHERE` term on a column of the virtual table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConstraint {
    /// Column index, -1 for the rowid
    pub column: i32,
    pub op: ConstraintOp,
    /// False when the term cannot be used by this plan
    pub usable: bool,
}

/// A single `ORDER BY` term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOrderBy {
    pub column: i32,
    pub desc: bool,
}

/// Mutable view over the `sqlite3_index_info` passed to `xBestIndex`
pub struct IndexInfo<'a> {
    raw: &'a mut ffi::sqlite3_index_info,
}

impl<'a> IndexInfo<'a> {
    /// # Safety
    ///
    /// `raw` must be a valid `sqlite3_index_info` whose constraint, order-by and
    /// usage arrays hold `nConstraint` / `nOrderBy` entries.
    pub unsafe fn from_raw(raw: *mut ffi::sqlite3_index_info) -> IndexInfo<'a> {
        IndexInfo { raw: &mut *raw }
    }

    pub fn constraints(&self) -> Vec<IndexConstraint> {
        self.raw_constraints()
            .iter()
            .map(|c| IndexConstraint {
                column: c.iColumn,
                op: ConstraintOp::from_raw(c.op),
                usable: c.usable != 0,
            })
            .collect()
    }

    pub fn order_by(&self) -> Vec<IndexOrderBy> {
        let n = self.raw.nOrderBy;
        if n <= 0 || self.raw.aOrderBy.is_null() {
            return Vec::new();
        }
        unsafe { slice::from_raw_parts(self.raw.aOrderBy, n as usize) }
            .iter()
            .map(|o| IndexOrderBy {
                column: o.iColumn,
                desc: o.desc != 0,
            })
            .collect()
    }

    /// Bitmask of columns the statement reads (bit 63 covers every column >= 63)
    pub fn column_used(&self) -> u64 {
        self.raw.colUsed
    }

    /// Pass the right-hand value of constraint `constraint` to `xFilter` as
    /// argument number `argv_index` (1-based; 0 means not passed)
    pub fn set_argv_index(&mut self, constraint: usize, argv_index: i32) {
        if let Some(usage) = self.usage_mut(constraint) {
            usage.argvIndex = argv_index;
        }
    }

    /// Tell SQLite it need not double-check constraint `constraint`
    pub fn set_omit(&mut self, constraint: usize, omit: bool) {
        if let Some(usage) = self.usage_mut(constraint) {
            usage.omit = omit as c_uchar;
        }
    }

    pub fn idx_num(&self) -> i32 {
        self.raw.idxNum
    }

    pub fn set_idx_num(&mut self, idx_num: i32) {
        self.raw.idxNum = idx_num;
    }

    pub fn idx_str(&self) -> Option<&str> {
        if self.raw.idxStr.is_null() {
            return None;
        }
        unsafe { CStr::from_ptr(self.raw.idxStr) }.to_str().ok()
    }

    /// Store a plan name that will be handed back to `xFilter`
    pub fn set_idx_str(&mut self, idx_str: &str) -> Result<()> {
        let value = CString::new(idx_str)?;
        unsafe {
            if self.raw.needToFreeIdxStr != 0 && !self.raw.idxStr.is_null() {
                ffi::sqlite3_free(self.raw.idxStr as *mut _);
            }
            self.raw.idxStr = ffi::sqlite3_mprintf(c"%s".as_ptr(), value.as_ptr()) as *mut c_char;
        }
        self.raw.needToFreeIdxStr = 1;
        Ok(())
    }

    pub fn set_order_by_consumed(&mut self, consumed: bool) {
        self.raw.orderByConsumed = consumed as c_int;
    }

    pub fn set_estimated_cost(&mut self, cost: f64) {
        self.raw.estimatedCost = cost;
    }

    pub fn set_estimated_rows(&mut self, rows: i64) {
        self.raw.estimatedRows = rows;
    }

    /// Mark the plan as returning at most one row
    pub fn set_unique(&mut self, unique: bool) {
        if unique {
            self.raw.idxFlags |= ffi::SQLITE_INDEX_SCAN_UNIQUE;
        } else {
            self.raw.idxFlags &= !ffi::SQLITE_INDEX_SCAN_UNIQUE;
        }
    }

    fn raw_constraints(&self) -> &[ffi::sqlite3_index_constraint] {
        let n = self.raw.nConstraint;
        if n <= 0 || self.raw.aConstraint.is_null() {
            return &[];
        }
        unsafe { slice::from_raw_parts(self.raw.aConstraint, n as usize) }
    }

    fn usage_mut(&mut self, constraint: usize) -> Option<&mut ffi::sqlite3_index_constraint_usage> {
        let n = self.raw.nConstraint;
        if n <= 0 || self.raw.aConstraintUsage.is_null() {
            return None;
        }
        unsafe { slice::from_raw_parts_mut(self.raw.aConstraintUsage, n as usize) }.get_mut(constraint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint(column: i32, op: c_int, usable: bool) -> ffi::sqlite3_index_constraint {
        let mut c: ffi::sqlite3_index_constraint = unsafe { std::mem::zeroed() };
        c.iColumn = column;
        c.op = op as c_uchar;
        c.usable = usable as c_uchar;
        c
    }

    #[test]
    fn test_constraint_ops() {
        assert_eq!(
            ConstraintOp::from_raw(ffi::SQLITE_INDEX_CONSTRAINT_EQ as c_uchar),
            ConstraintOp::Eq
        );
        assert_eq!(
            ConstraintOp::from_raw(ffi::SQLITE_INDEX_CONSTRAINT_LIMIT as c_uchar),
            ConstraintOp::Limit
        );
        assert_eq!(ConstraintOp::from_raw(151), ConstraintOp::Function(151));
        assert_eq!(ConstraintOp::from_raw(3), ConstraintOp::Unknown(3));
    }

    #[test]
    fn test_index_info_view() {
        let mut constraints = vec![
            constraint(0, ffi::SQLITE_INDEX_CONSTRAINT_EQ, true),
            constraint(2, ffi::SQLITE_INDEX_CONSTRAINT_GT, false),
        ];
        let mut usage: Vec<ffi::sqlite3_index_constraint_usage> =
            vec![unsafe { std::mem::zeroed() }; 2];
        let mut order: ffi::sqlite3_index_orderby = unsafe { std::mem::zeroed() };
        order.iColumn = 1;
        order.desc = 1;
        let mut order_by = vec![order];

        let mut raw: ffi::sqlite3_index_info = unsafe { std::mem::zeroed() };
        raw.nConstraint = 2;
        raw.aConstraint = constraints.as_mut_ptr();
        raw.aConstraintUsage = usage.as_mut_ptr();
        raw.nOrderBy = 1;
        raw.aOrderBy = order_by.as_mut_ptr();
        raw.colUsed = 0b101;

        {
            let mut info = unsafe { IndexInfo::from_raw(&mut raw) };
            let seen = info.constraints();
            assert_eq!(seen.len(), 2);
            assert_eq!(seen[0].op, ConstraintOp::Eq);
            assert!(seen[0].usable);
            assert_eq!(seen[1].column, 2);
            assert!(!seen[1].usable);
            assert_eq!(info.order_by(), vec![IndexOrderBy { column: 1, desc: true }]);
            assert_eq!(info.column_used(), 0b101);

            info.set_argv_index(0, 1);
            info.set_omit(0, true);
            // Out of range is ignored
            info.set_argv_index(5, 2);
            info.set_idx_num(3);
            info.set_order_by_consumed(true);
            info.set_estimated_cost(10.0);
            info.set_estimated_rows(1);
            info.set_unique(true);
            info.set_idx_str("by-key").unwrap();
            assert_eq!(info.idx_str(), Some("by-key"));
            info.set_idx_str("by-key-2").unwrap();
            assert_eq!(info.idx_num(), 3);
        }

        assert_eq!(usage[0].argvIndex, 1);
        assert_eq!(usage[0].omit, 1);
        assert_eq!(usage[1].argvIndex, 0);
        assert_eq!(raw.orderByConsumed, 1);
        assert_eq!(raw.estimatedCost, 10.0);
        assert_eq!(raw.estimatedRows, 1);
        assert_eq!(raw.idxFlags & ffi::SQLITE_INDEX_SCAN_UNIQUE, ffi::SQLITE_INDEX_SCAN_UNIQUE);
        assert_eq!(raw.needToFreeIdxStr, 1);
        let idx_str = unsafe { CStr::from_ptr(raw.idxStr) }.to_str().unwrap();
        assert_eq!(idx_str, "by-key-2");
        unsafe { ffi::sqlite3_free(raw.idxStr as *mut _) };
    }

    #[test]
    fn test_empty_index_info() {
        let mut raw: ffi::sqlite3_index_info = unsafe { std::mem::zeroed() };
        let mut info = unsafe { IndexInfo::from_raw(&mut raw) };
        assert!(info.constraints().is_empty());
        assert!(info.order_by().is_empty());
        assert_eq!(info.idx_str(), None);
        info.set_omit(0, true);
    }
}
