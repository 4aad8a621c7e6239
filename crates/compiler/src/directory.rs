//! The symbol directory: function scopes, declarations and lookup.
//!
//! One global scope plus one scope per declared function. The parser keeps
//! the directory's cursor pointing at the function being defined; lookups
//! search the current scope first and fall back to the global one.

use crate::codegen::QuadrupleGenerator;
use std::collections::HashMap;
use symphony_core::{DataType, FunctionInfo, SymphonyError};

/// What a name is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Scalar(DataType),
    Array { elem_type: DataType, size: i64 },
}

/// A declared variable.
#[derive(Debug, Clone, Copy)]
pub struct Variable {
    pub address: u32,
    pub kind: VarKind,
}

/// One variable as the parser saw it, before addresses exist.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub data_type: DataType,
    pub name: String,
    /// Array size literal: its type and, when the type is `INT`, its value.
    pub array_size: Option<(DataType, i64)>,
}

/// A parameter as the parser saw it.
pub type Parameter = (DataType, String);

/// Everything known about one scope.
#[derive(Debug, Default)]
pub struct FunctionScope {
    /// `None` means `VOID`.
    pub return_type: Option<DataType>,
    pub variables: HashMap<String, Variable>,
    pub parameter_types: Vec<DataType>,
    pub parameter_addresses: Vec<u32>,
    pub starting_quad: usize,
    /// The dedicated local return slot, once a `return` has been seen.
    pub return_address: Option<u32>,
}

#[derive(Debug)]
pub struct Directory {
    global: FunctionScope,
    functions: HashMap<String, FunctionScope>,
    /// The function being defined, or `None` at top level.
    current: Option<String>,
}

impl Directory {
    pub fn new() -> Self {
        Directory {
            global: FunctionScope::default(),
            functions: HashMap::new(),
            current: None,
        }
    }

    pub fn at_global_scope(&self) -> bool {
        self.current.is_none()
    }

    pub fn current_function_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionScope> {
        self.functions.get(name)
    }

    pub fn current_scope(&self) -> &FunctionScope {
        match &self.current {
            Some(name) => &self.functions[name],
            None => &self.global,
        }
    }

    pub fn current_scope_mut(&mut self) -> &mut FunctionScope {
        match &self.current {
            Some(name) => self
                .functions
                .get_mut(name)
                .unwrap_or(&mut self.global),
            None => &mut self.global,
        }
    }

    /// Open a new function scope and point the cursor at it.
    pub fn define_function(
        &mut self,
        return_type: Option<DataType>,
        name: &str,
        starting_quad: usize,
        line: usize,
    ) -> Result<(), SymphonyError> {
        if self.functions.contains_key(name) {
            return Err(SymphonyError::redeclaration(
                line,
                format!(
                    "you are defining your {} function more than once",
                    name
                ),
            ));
        }
        self.functions.insert(
            name.to_string(),
            FunctionScope {
                starting_quad,
                ..FunctionScope::default()
            },
        );
        self.current = Some(name.to_string());
        self.current_scope_mut().return_type = return_type;
        Ok(())
    }

    /// Declare a bundle of parameters and variables into the current scope.
    /// Parameters additionally extend the scope's signature, in declaration
    /// order.
    pub fn declare_variables(
        &mut self,
        parameters: &[Parameter],
        variables: &[Declaration],
        line: usize,
        is_global: bool,
        generator: &mut QuadrupleGenerator,
    ) -> Result<(), SymphonyError> {
        for (data_type, name) in parameters {
            let declaration = Declaration {
                data_type: *data_type,
                name: name.clone(),
                array_size: None,
            };
            self.declare_one(&declaration, is_global, line, generator)?;
            let address = self.current_scope().variables[name].address;
            let scope = self.current_scope_mut();
            scope.parameter_types.push(*data_type);
            scope.parameter_addresses.push(address);
        }

        for declaration in variables {
            self.declare_one(declaration, is_global, line, generator)?;
        }
        Ok(())
    }

    fn declare_one(
        &mut self,
        declaration: &Declaration,
        is_global: bool,
        line: usize,
        generator: &mut QuadrupleGenerator,
    ) -> Result<(), SymphonyError> {
        if self
            .current_scope()
            .variables
            .contains_key(&declaration.name)
        {
            return Err(SymphonyError::redeclaration(
                line,
                format!(
                    "you are declaring your {} variable more than once",
                    declaration.name
                ),
            ));
        }

        let variable = match declaration.array_size {
            None => Variable {
                address: generator.generate_variable_address(
                    declaration.data_type,
                    is_global,
                    1,
                    line,
                )?,
                kind: VarKind::Scalar(declaration.data_type),
            },
            Some((size_type, size)) => {
                if size_type != DataType::Int {
                    return Err(SymphonyError::type_error(
                        line,
                        format!(
                            "you are trying to declare an array size using a(n) {}, \
                             but you should use a(n) {} instead",
                            size_type,
                            DataType::Int
                        ),
                    ));
                }
                let slots = u32::try_from(size).map_err(|_| {
                    SymphonyError::capacity(
                        line,
                        format!(
                            "your {} array asks for more space than the orchestra provides",
                            declaration.name
                        ),
                    )
                })?;
                Variable {
                    address: generator.generate_variable_address(
                        declaration.data_type,
                        is_global,
                        slots,
                        line,
                    )?,
                    kind: VarKind::Array {
                        elem_type: declaration.data_type,
                        size,
                    },
                }
            }
        };
        self.current_scope_mut()
            .variables
            .insert(declaration.name.clone(), variable);
        Ok(())
    }

    /// Resolve a name: current scope first, then the global one.
    pub fn get_variable(&self, name: &str, line: usize) -> Result<Variable, SymphonyError> {
        self.current_scope()
            .variables
            .get(name)
            .or_else(|| self.global.variables.get(name))
            .copied()
            .ok_or_else(|| {
                SymphonyError::undeclared(
                    line,
                    format!(
                        "You tried to use the variable {}, but it was not declared \
                         beforehand. Check if you wrote the name correctly and if you \
                         are trying to use a variable defined inside another function",
                        name
                    ),
                )
            })
    }

    /// Close the current function: enforce the return rule, drop its local
    /// variables and hand the name back so the caller can emit `ENDPROC`.
    pub fn end_definition(&mut self, line: usize) -> Result<String, SymphonyError> {
        let name = match self.current.take() {
            Some(name) => name,
            None => {
                return Err(SymphonyError::misplaced(
                    line,
                    "a function definition ended outside a function",
                ));
            }
        };
        let scope = self
            .functions
            .get_mut(&name)
            .ok_or_else(|| {
                SymphonyError::misplaced(line, "a function definition ended before it began")
            })?;
        if let Some(return_type) = scope.return_type
            && scope.return_address.is_none()
        {
            // Restore the cursor so the error carries context if inspected.
            self.current = Some(name.clone());
            return Err(SymphonyError::misplaced(
                line,
                format!(
                    "This function was supposed to return a(n) {}, but it does \
                     not return anything",
                    return_type
                ),
            ));
        }
        scope.variables.clear();
        Ok(name)
    }

    /// The VM-facing function table.
    pub fn into_function_table(self) -> HashMap<String, FunctionInfo> {
        self.functions
            .into_iter()
            .map(|(name, scope)| {
                let info = FunctionInfo {
                    name: name.clone(),
                    return_type: scope.return_type,
                    parameter_types: scope.parameter_types,
                    parameter_addresses: scope.parameter_addresses,
                    starting_quad: scope.starting_quad,
                    return_address: scope.return_address,
                };
                (name, info)
            })
            .collect()
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}
