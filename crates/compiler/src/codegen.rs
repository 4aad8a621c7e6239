//! The quadruple generator.
//!
//! Driven by the parser's semantic actions. Owns the operand stack, the
//! jump bookkeeping, the call machinery, the constant pool and the address
//! allocator; everything lives in one value created per compilation, so
//! repeated compilations are independent.

use crate::builtins;
use crate::cube;
use crate::directory::{Directory, VarKind, Variable};
use ordered_float::OrderedFloat;
use std::collections::HashMap;
use symphony_core::{
    AddressAllocator, BinOp, CompiledProgram, DataType, ErrorKind, Operand, Quad, Sector,
    SpecialOp, SymphonyError, UnOp, Value,
};

/// Interned literals, one map per type so values can key directly.
#[derive(Debug, Default)]
struct ConstantPool {
    ints: HashMap<i64, u32>,
    decs: HashMap<OrderedFloat<f64>, u32>,
    chars: HashMap<char, u32>,
    strs: HashMap<String, u32>,
    bools: HashMap<bool, u32>,
}

impl ConstantPool {
    fn lookup(&self, value: &Value) -> Option<u32> {
        match value {
            Value::Int(n) => self.ints.get(n).copied(),
            Value::Dec(d) => self.decs.get(&OrderedFloat(*d)).copied(),
            Value::Char(c) => self.chars.get(c).copied(),
            Value::Str(s) => self.strs.get(s).copied(),
            Value::Bool(b) => self.bools.get(b).copied(),
        }
    }

    fn insert(&mut self, value: Value, address: u32) {
        match value {
            Value::Int(n) => {
                self.ints.insert(n, address);
            }
            Value::Dec(d) => {
                self.decs.insert(OrderedFloat(d), address);
            }
            Value::Char(c) => {
                self.chars.insert(c, address);
            }
            Value::Str(s) => {
                self.strs.insert(s, address);
            }
            Value::Bool(b) => {
                self.bools.insert(b, address);
            }
        }
    }

    /// Invert to the address-keyed map the VM seeds its constant sector from.
    fn into_address_map(self) -> HashMap<u32, Value> {
        let mut map = HashMap::new();
        map.extend(self.ints.into_iter().map(|(v, a)| (a, Value::Int(v))));
        map.extend(self.decs.into_iter().map(|(v, a)| (a, Value::Dec(v.0))));
        map.extend(self.chars.into_iter().map(|(v, a)| (a, Value::Char(v))));
        map.extend(self.strs.into_iter().map(|(v, a)| (a, Value::Str(v))));
        map.extend(self.bools.into_iter().map(|(v, a)| (a, Value::Bool(v))));
        map
    }
}

#[derive(Debug)]
pub struct QuadrupleGenerator {
    quadruples: Vec<Quad>,
    /// Typed operands of the expression being parsed.
    operands: Vec<(DataType, Operand)>,
    /// Quad indices whose jump target is still open.
    pending_jumps: Vec<usize>,
    /// Operators of a same-precedence chain, gathered until the chain ends.
    chained_operators: Vec<BinOp>,
    called_functions: Vec<String>,
    /// Evaluated argument lists, one frame per call in flight, so a call
    /// inside an argument cannot steal the outer call's arguments.
    arguments: Vec<Vec<(DataType, Operand)>>,
    /// Self-recursive call sites waiting for the function's return slot.
    recursive_calls: Vec<(usize, Operand)>,
    pending_breaks: Vec<usize>,
    pending_returns: Vec<usize>,
    open_whiles: usize,
    /// Offset stashed by an array-element assignment target.
    pending_array_offset: Option<(DataType, Operand)>,
    constants: ConstantPool,
    allocator: AddressAllocator,
}

impl QuadrupleGenerator {
    pub fn new() -> Self {
        QuadrupleGenerator {
            quadruples: Vec::new(),
            operands: Vec::new(),
            pending_jumps: Vec::new(),
            chained_operators: Vec::new(),
            called_functions: Vec::new(),
            arguments: Vec::new(),
            recursive_calls: Vec::new(),
            pending_breaks: Vec::new(),
            pending_returns: Vec::new(),
            open_whiles: 0,
            pending_array_offset: None,
            constants: ConstantPool::default(),
            allocator: AddressAllocator::new(),
        }
    }

    pub fn quad_count(&self) -> usize {
        self.quadruples.len()
    }

    fn emit(&mut self, quad: Quad) {
        self.quadruples.push(quad);
    }

    fn patch_jump(&mut self, index: usize, target: usize) -> Result<(), SymphonyError> {
        match self.quadruples.get_mut(index) {
            Some(Quad::Goto { target: slot }) | Some(Quad::Gotof { target: slot, .. }) => {
                *slot = Some(target);
                Ok(())
            }
            _ => Err(Self::lost_jump()),
        }
    }

    fn lost_jump() -> SymphonyError {
        SymphonyError::runtime(
            ErrorKind::NotImplemented,
            "the compiler lost track of a pending jump",
        )
    }

    fn empty_operand_error(line: usize) -> SymphonyError {
        SymphonyError::type_error(
            line,
            "You can't use a void function here because it does not return a value",
        )
    }

    fn pop_operand(&mut self, line: usize) -> Result<(DataType, Operand), SymphonyError> {
        self.operands
            .pop()
            .ok_or_else(|| Self::empty_operand_error(line))
    }

    pub fn push_operand(&mut self, data_type: DataType, operand: Operand) {
        self.operands.push((data_type, operand));
    }

    /// Drop the topmost operand; array-size literals are interned but never
    /// read back.
    pub fn discard_operand(&mut self, line: usize) -> Result<(), SymphonyError> {
        self.pop_operand(line).map(|_| ())
    }

    // ----- addresses and constants -----

    /// New variable address in the scope's sector; arrays reserve their
    /// whole extent.
    pub fn generate_variable_address(
        &mut self,
        data_type: DataType,
        is_global: bool,
        reserved: u32,
        line: usize,
    ) -> Result<u32, SymphonyError> {
        let sector = if is_global {
            Sector::Global
        } else {
            Sector::Local
        };
        self.allocator.reserve(sector, data_type, reserved, line)
    }

    fn generate_temporal_address(
        &mut self,
        data_type: DataType,
        line: usize,
    ) -> Result<Operand, SymphonyError> {
        let address = self
            .allocator
            .reserve(Sector::Temporal, data_type, 1, line)?;
        Ok(Operand::direct(address))
    }

    /// Intern a literal and push it as an operand. The same literal always
    /// lands on the same address.
    pub fn push_constant(&mut self, value: Value, line: usize) -> Result<(), SymphonyError> {
        let data_type = value.data_type();
        let address = match self.constants.lookup(&value) {
            Some(address) => address,
            None => {
                let address = self
                    .allocator
                    .reserve(Sector::Constant, data_type, 1, line)?;
                self.constants.insert(value, address);
                address
            }
        };
        self.operands.push((data_type, Operand::direct(address)));
        Ok(())
    }

    // ----- expressions -----

    fn combine(
        &mut self,
        op: BinOp,
        left: (DataType, Operand),
        right: (DataType, Operand),
        line: usize,
    ) -> Result<(DataType, Operand), SymphonyError> {
        let result_type = cube::binary_result(left.0, right.0, op).ok_or_else(|| {
            SymphonyError::type_error(
                line,
                format!(
                    "The {} operation cannot be used for types {} and {}",
                    op, left.0, right.0
                ),
            )
        })?;
        let dest = self.generate_temporal_address(result_type, line)?;
        self.emit(Quad::Binary {
            op,
            left: left.1,
            right: right.1,
            dest,
        });
        Ok((result_type, dest))
    }

    /// Right-associative operators (`**`): combine the two topmost operands.
    pub fn operate_right(&mut self, op: BinOp, line: usize) -> Result<(), SymphonyError> {
        let right = self.pop_operand(line)?;
        let left = self.pop_operand(line)?;
        let result = self.combine(op, left, right, line)?;
        self.operands.push(result);
        Ok(())
    }

    /// Record one more operator of a same-precedence chain.
    pub fn push_chained_operator(&mut self, op: BinOp) {
        self.chained_operators.push(op);
    }

    /// Left-associative operators: fold the whole collected chain, one
    /// fresh temporary per combination.
    pub fn operate_left(&mut self, first_op: BinOp, line: usize) -> Result<(), SymphonyError> {
        let mut operators = vec![first_op];
        operators.append(&mut self.chained_operators);

        if self.operands.len() < operators.len() + 1 {
            return Err(Self::empty_operand_error(line));
        }
        let first_index = self.operands.len() - operators.len() - 1;
        let right_operands = self.operands.split_off(first_index + 1);
        let mut left = self
            .operands
            .pop()
            .ok_or_else(|| Self::empty_operand_error(line))?;

        for (right, op) in right_operands.into_iter().zip(operators) {
            left = self.combine(op, left, right, line)?;
        }
        self.operands.push(left);
        Ok(())
    }

    /// Unary operators. `++`/`--` update their operand in place; the others
    /// write a fresh temporary.
    pub fn operate_unary(&mut self, op: UnOp, line: usize) -> Result<(), SymphonyError> {
        let (data_type, operand) = self.pop_operand(line)?;
        let result_type = cube::unary_result(data_type, op).ok_or_else(|| {
            SymphonyError::type_error(
                line,
                format!(
                    "The {} operation cannot be used for type {}",
                    op, data_type
                ),
            )
        })?;
        let dest = match op {
            UnOp::Increment | UnOp::Decrement => operand,
            _ => self.generate_temporal_address(result_type, line)?,
        };
        self.emit(Quad::Unary {
            op,
            src: operand,
            dest,
        });
        self.operands.push((result_type, dest));
        Ok(())
    }

    // ----- control flow -----

    /// Quad 0 is reserved: an unconditional jump over all function bodies.
    pub fn reserve_main_goto(&mut self) {
        self.emit(Quad::Goto { target: None });
    }

    /// Point the reserved quad 0 at the first quad of the main body.
    pub fn generate_main_goto(&mut self) -> Result<(), SymphonyError> {
        let target = self.quad_count();
        self.patch_jump(0, target)
    }

    /// Shared opening of `if` and `while`: consume the condition, require
    /// `BOOL`, emit an open `GOTOF`.
    pub fn generate_boolean_structure(
        &mut self,
        line: usize,
        structure_name: &str,
    ) -> Result<(), SymphonyError> {
        let (data_type, operand) = self.pop_operand(line)?;
        if data_type != DataType::Bool {
            return Err(SymphonyError::type_error(
                line,
                format!(
                    "The code inside your {} must receive a {} inside its \
                     parenthesis, but a(n) {} was found.",
                    structure_name,
                    DataType::Bool,
                    data_type
                ),
            ));
        }
        self.pending_jumps.push(self.quad_count());
        self.emit(Quad::Gotof {
            cond: operand,
            target: None,
        });
        Ok(())
    }

    /// Close an open `if`'s (or `elseif`'s) jump at the current quad.
    pub fn add_pending_if(&mut self) -> Result<(), SymphonyError> {
        let index = self.pending_jumps.pop().ok_or_else(Self::lost_jump)?;
        let target = self.quad_count();
        self.patch_jump(index, target)
    }

    /// Entering an `else`/`elseif`: emit the jump over the alternative and
    /// route the previous `GOTOF` past it.
    pub fn add_else_jumps(&mut self) -> Result<(), SymphonyError> {
        let pending_if = self.pending_jumps.pop().ok_or_else(Self::lost_jump)?;
        self.pending_jumps.push(self.quad_count());
        self.emit(Quad::Goto { target: None });
        let target = self.quad_count();
        self.patch_jump(pending_if, target)
    }

    /// Record the loop head, before the condition's first quad.
    pub fn store_expression_position(&mut self) {
        self.pending_jumps.push(self.quad_count());
    }

    pub fn begin_while(&mut self) {
        self.open_whiles += 1;
    }

    /// Close a `while`: jump back to the head, route the `GOTOF` and every
    /// accumulated `break` past the loop.
    pub fn add_pending_while(&mut self) -> Result<(), SymphonyError> {
        let gotof = self.pending_jumps.pop().ok_or_else(Self::lost_jump)?;
        let head = self.pending_jumps.pop().ok_or_else(Self::lost_jump)?;
        self.emit(Quad::Goto { target: Some(head) });

        let after_while = self.quad_count();
        self.patch_jump(gotof, after_while)?;
        for pending_break in std::mem::take(&mut self.pending_breaks) {
            self.patch_jump(pending_break, after_while)?;
        }
        self.open_whiles -= 1;
        Ok(())
    }

    pub fn generate_break(&mut self, line: usize) -> Result<(), SymphonyError> {
        if self.open_whiles == 0 {
            return Err(SymphonyError::misplaced(
                line,
                "You must be inside a while to use a break",
            ));
        }
        self.pending_breaks.push(self.quad_count());
        self.emit(Quad::Goto { target: None });
        Ok(())
    }

    // ----- assignment and array access -----

    /// Remember the already-evaluated offset of an `a[i] = ...` target.
    pub fn stash_array_offset(&mut self, line: usize) -> Result<(), SymphonyError> {
        let offset = self.pop_operand(line)?;
        self.pending_array_offset = Some(offset);
        Ok(())
    }

    /// Assign the expression on the operand stack to a named target,
    /// consuming a stashed array offset if the target was indexed.
    pub fn assign(
        &mut self,
        name: &str,
        directory: &Directory,
        line: usize,
    ) -> Result<(), SymphonyError> {
        let variable = directory.get_variable(name, line)?;

        let (left_type, left_operand) = match self.pending_array_offset.take() {
            None => match variable.kind {
                VarKind::Scalar(data_type) => (data_type, Operand::direct(variable.address)),
                VarKind::Array { .. } => {
                    return Err(SymphonyError::type_error(
                        line,
                        "You can't assign an array directly. You can, however, \
                         assign each element individually using the '[]' symbols",
                    ));
                }
            },
            Some((offset_type, offset)) => {
                self.element_operand(name, variable, offset_type, offset, line)?
            }
        };

        let (right_type, right_operand) = self.pop_operand(line)?;
        if left_type != right_type {
            return Err(SymphonyError::type_error(
                line,
                format!(
                    "you are trying to assign a(n) {} value to a(n) {} type",
                    right_type, left_type
                ),
            ));
        }
        self.emit(Quad::Assign {
            src: right_operand,
            dest: left_operand,
        });
        Ok(())
    }

    /// Bound-check an offset and materialize the element's address: emits
    /// `VER` and `ACCESS`, hands back the `&`-operand.
    fn element_operand(
        &mut self,
        name: &str,
        variable: Variable,
        offset_type: DataType,
        offset: Operand,
        line: usize,
    ) -> Result<(DataType, Operand), SymphonyError> {
        if offset_type != DataType::Int {
            return Err(SymphonyError::type_error(
                line,
                format!(
                    "you are trying to access an array using a(n) {}, but you \
                     should use a(n) {} instead",
                    offset_type,
                    DataType::Int
                ),
            ));
        }
        let VarKind::Array { elem_type, size } = variable.kind else {
            return Err(SymphonyError::type_error(
                line,
                format!(
                    "you tried to access your {} variable, but it's not an array",
                    name
                ),
            ));
        };
        self.emit(Quad::Ver {
            offset,
            lower: 0,
            upper: size,
        });
        let pointer = self.generate_temporal_address(elem_type, line)?;
        self.emit(Quad::Access {
            base: variable.address,
            offset,
            dest: pointer,
        });
        Ok((elem_type, Operand::indirect(pointer.address)))
    }

    /// An `a[i]` read: consume the offset operand, emit the check and the
    /// access, and hand back the element operand for the caller to push.
    pub fn generate_access(
        &mut self,
        name: &str,
        directory: &Directory,
        line: usize,
    ) -> Result<(DataType, Operand), SymphonyError> {
        let (offset_type, offset) = self.pop_operand(line)?;
        let variable = directory.get_variable(name, line)?;
        self.element_operand(name, variable, offset_type, offset, line)
    }

    // ----- calls -----

    pub fn init_call(
        &mut self,
        name: &str,
        directory: &Directory,
        line: usize,
    ) -> Result<(), SymphonyError> {
        if !directory.has_function(name) {
            return Err(SymphonyError::undeclared(
                line,
                format!(
                    "You tried to use the function {}, but it was not defined \
                     beforehand. Check if you wrote the name correctly.",
                    name
                ),
            ));
        }
        self.called_functions.push(name.to_string());
        self.arguments.push(Vec::new());
        Ok(())
    }

    pub fn init_special(&mut self, name: &str) {
        self.called_functions.push(name.to_string());
        self.arguments.push(Vec::new());
    }

    /// Move one evaluated argument off the operand stack into the innermost
    /// call's frame.
    pub fn read_argument(&mut self, line: usize) -> Result<(), SymphonyError> {
        let argument = self.pop_operand(line)?;
        self.arguments
            .last_mut()
            .ok_or_else(Self::lost_call)?
            .push(argument);
        Ok(())
    }

    fn pop_called_function(&mut self) -> Result<(String, Vec<(DataType, Operand)>), SymphonyError> {
        let name = self.called_functions.pop().ok_or_else(Self::lost_call)?;
        let arguments = self.arguments.pop().ok_or_else(Self::lost_call)?;
        Ok((name, arguments))
    }

    fn lost_call() -> SymphonyError {
        SymphonyError::runtime(
            ErrorKind::NotImplemented,
            "the compiler lost track of a call in progress",
        )
    }

    fn check_arity(
        name: &str,
        sent: usize,
        needed: usize,
        line: usize,
    ) -> Result<(), SymphonyError> {
        if sent != needed {
            return Err(SymphonyError::arity(
                line,
                format!(
                    "You are sending the wrong number of arguments ({}) to {}. \
                     It needs {}",
                    sent, name, needed
                ),
            ));
        }
        Ok(())
    }

    /// Finish a user-function call: validate the signature, emit `PARAM`s
    /// and `GOSUB`, and wire up the return value.
    pub fn call(&mut self, directory: &Directory, line: usize) -> Result<(), SymphonyError> {
        let (name, arguments) = self.pop_called_function()?;
        let function = directory.function(&name).ok_or_else(|| {
            SymphonyError::runtime(
                ErrorKind::NotImplemented,
                format!("the function {} vanished between lookup and call", name),
            )
        })?;

        Self::check_arity(&name, arguments.len(), function.parameter_types.len(), line)?;

        for (position, ((argument_type, argument), parameter_type)) in arguments
            .iter()
            .zip(&function.parameter_types)
            .enumerate()
            .map(|(i, pair)| (i + 1, pair))
        {
            if argument_type != parameter_type {
                return Err(SymphonyError::type_error(
                    line,
                    format!(
                        "Your call to {} sent a(n) {} as the argument number {}, \
                         but a(n) {} was expected",
                        name, argument_type, position, parameter_type
                    ),
                ));
            }
            self.emit(Quad::Param {
                arg: *argument,
                index: position,
            });
        }

        let return_type = function.return_type;
        let return_address = function.return_address;
        self.emit(Quad::Gosub {
            function: name.clone(),
        });

        if let Some(return_type) = return_type {
            // The result lives in the caller's own sector so the activation
            // record save/restore preserves it.
            let result_address = self.generate_variable_address(
                return_type,
                directory.at_global_scope(),
                1,
                line,
            )?;
            let result = Operand::direct(result_address);
            self.operands.push((return_type, result));

            match return_address {
                Some(slot) => self.emit(Quad::Assign {
                    src: Operand::direct(slot),
                    dest: result,
                }),
                None => {
                    // Mid-definition self-recursion: the return slot does
                    // not exist yet. Emit a placeholder and let the first
                    // return rewrite it.
                    self.recursive_calls.push((self.quad_count(), result));
                    self.emit(Quad::Assign {
                        src: result,
                        dest: result,
                    });
                }
            }
        }
        Ok(())
    }

    /// Finish a reserved-function call against its fixed signature.
    pub fn special_call(&mut self, line: usize) -> Result<(), SymphonyError> {
        let (name, arguments) = self.pop_called_function()?;
        let Some(signature) = builtins::special_signature(&name) else {
            return Err(SymphonyError::new(
                ErrorKind::NotImplemented,
                Some(line),
                format!("This operation isn't supported yet ({})", name),
            ));
        };

        Self::check_arity(&name, arguments.len(), signature.parameter_types.len(), line)?;

        // copy writes through its first argument, so that argument must be
        // a plain variable, not an expression or an array element.
        if signature.op == SpecialOp::Copy
            && let Some((_, destination)) = arguments.first()
            && (destination.indirect
                || !matches!(
                    Sector::of(destination.address),
                    Some(Sector::Global | Sector::Local)
                ))
        {
            return Err(SymphonyError::type_error(
                line,
                format!(
                    "the first argument of {} must be a variable, because its \
                     value is replaced",
                    name
                ),
            ));
        }

        for (position, ((argument_type, argument), allowed)) in arguments
            .iter()
            .zip(&signature.parameter_types)
            .enumerate()
            .map(|(i, pair)| (i + 1, pair))
        {
            if !allowed.contains(argument_type) {
                let allowed_list = allowed
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(SymphonyError::type_error(
                    line,
                    format!(
                        "Your call to {} sent a(n) {} as the argument number {}, \
                         but one of these was expected: {}",
                        name, argument_type, position, allowed_list
                    ),
                ));
            }
            self.emit(Quad::Param {
                arg: *argument,
                index: position,
            });
        }

        match signature.return_type {
            None => self.emit(Quad::Special {
                op: signature.op,
                result: None,
            }),
            Some(return_type) => {
                let result = self.generate_temporal_address(return_type, line)?;
                self.emit(Quad::Special {
                    op: signature.op,
                    result: Some(result),
                });
                self.operands.push((return_type, result));
            }
        }
        Ok(())
    }

    // ----- returns -----

    /// A `return expr`: validate against the function's signature, route
    /// the value into the dedicated return slot and jump to `ENDPROC`.
    pub fn generate_return(
        &mut self,
        directory: &mut Directory,
        line: usize,
    ) -> Result<(), SymphonyError> {
        if directory.at_global_scope() {
            return Err(SymphonyError::misplaced(
                line,
                "You cannot use return if you are not inside a function",
            ));
        }

        let scope = directory.current_scope();
        let return_type = scope.return_type;
        let return_address = scope.return_address;

        let (value_type, value) = self.pop_operand(line)?;
        let Some(expected) = return_type else {
            return Err(SymphonyError::misplaced(
                line,
                "This function was declared with a VOID return type, so it \
                 should not have a return here",
            ));
        };
        if value_type != expected {
            let name = directory.current_function_name().unwrap_or_default();
            return Err(SymphonyError::type_error(
                line,
                format!(
                    "Your {} should return a(n) {}, but it tried to return a(n) {}",
                    name, expected, value_type
                ),
            ));
        }

        let slot = match return_address {
            Some(slot) => slot,
            None => {
                // First return: create the function's return slot and
                // rewrite the placeholder assigns of self-recursive calls.
                let slot = self.generate_variable_address(expected, false, 1, line)?;
                directory.current_scope_mut().return_address = Some(slot);
                for (index, result) in std::mem::take(&mut self.recursive_calls) {
                    self.quadruples[index] = Quad::Assign {
                        src: Operand::direct(slot),
                        dest: result,
                    };
                }
                slot
            }
        };

        self.emit(Quad::Assign {
            src: value,
            dest: Operand::direct(slot),
        });
        self.pending_returns.push(self.quad_count());
        self.emit(Quad::Goto { target: None });
        Ok(())
    }

    /// Close a function body: point every pending return at the `ENDPROC`
    /// quad and emit it.
    pub fn emit_endproc(&mut self, function: String) -> Result<(), SymphonyError> {
        let endproc_index = self.quad_count();
        for pending in std::mem::take(&mut self.pending_returns) {
            self.patch_jump(pending, endproc_index)?;
        }
        self.recursive_calls.clear();
        self.emit(Quad::Endproc { function });
        Ok(())
    }

    // ----- finalization -----

    /// Validate the jump invariant and assemble the compiled program.
    ///
    /// A target equal to the quad count is legal: it is the termination
    /// address a trailing loop or branch falls off to.
    pub fn finish(self, directory: Directory) -> Result<CompiledProgram, SymphonyError> {
        let count = self.quadruples.len();
        for quad in &self.quadruples {
            let target = match quad {
                Quad::Goto { target } | Quad::Gotof { target, .. } => *target,
                _ => continue,
            };
            match target {
                Some(target) if target <= count => {}
                _ => return Err(Self::lost_jump()),
            }
        }
        Ok(CompiledProgram {
            quads: self.quadruples,
            constants: self.constants.into_address_map(),
            functions: directory.into_function_table(),
        })
    }
}

impl Default for QuadrupleGenerator {
    fn default() -> Self {
        Self::new()
    }
}
